pub mod precedences;
