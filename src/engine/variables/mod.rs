mod integer_literal;
mod integer_variable;
mod literal;
mod propositional_variable;

pub use integer_literal::IntegerLiteral;
pub use integer_variable::IntegerVariable;
pub use literal::Literal;
pub use propositional_variable::PropositionalVariable;
