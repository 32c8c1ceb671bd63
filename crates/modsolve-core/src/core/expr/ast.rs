/// Unary operators supported in model expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
}

/// Binary operators supported in model expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    /// Exponentiation (`^`), right-associative.
    Pow,
}

/// The fixed set of built-in functions available in model expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Atan,
    Exp,
    Ln,
    Log10,
    Sqrt,
    Abs,
    Tanh,
    Sign,
    Min,
    Max,
}

impl Func {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Func::Sin),
            "cos" => Some(Func::Cos),
            "tan" => Some(Func::Tan),
            "atan" => Some(Func::Atan),
            "exp" => Some(Func::Exp),
            "ln" => Some(Func::Ln),
            "log10" => Some(Func::Log10),
            "sqrt" => Some(Func::Sqrt),
            "abs" => Some(Func::Abs),
            "tanh" => Some(Func::Tanh),
            "sign" => Some(Func::Sign),
            "min" => Some(Func::Min),
            "max" => Some(Func::Max),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Atan => "atan",
            Func::Exp => "exp",
            Func::Ln => "ln",
            Func::Log10 => "log10",
            Func::Sqrt => "sqrt",
            Func::Abs => "abs",
            Func::Tanh => "tanh",
            Func::Sign => "sign",
            Func::Min => "min",
            Func::Max => "max",
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Func::Min | Func::Max => 2,
            _ => 1,
        }
    }
}

/// A compiled scalar expression over the symbols of a model.
///
/// Symbols are referenced by their index into the model's symbol table, so an
/// expression evaluates directly against the flat value slice the solvers
/// iterate over, with no name lookups on the hot path.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A numeric literal (also produced for the constants `pi` and `e`).
    Number(f64),
    /// The value of the symbol at the given index.
    Symbol(usize),
    /// The simulation time `t`. Only valid in dynamic models.
    Time,
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

impl Expr {
    /// Evaluates the expression against the given symbol values at time `t`.
    ///
    /// Symbol indices are validated when the expression is compiled, so
    /// `values` must be the full value vector of the model the expression was
    /// compiled against.
    pub fn eval(&self, values: &[f64], t: f64) -> f64 {
        match self {
            Expr::Number(v) => *v,
            Expr::Symbol(i) => values[*i],
            Expr::Time => t,
            Expr::Unary(UnaryOp::Neg, operand) => -operand.eval(values, t),
            Expr::Binary(op, lhs, rhs) => {
                let a = lhs.eval(values, t);
                let b = rhs.eval(values, t);
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Pow => a.powf(b),
                }
            }
            Expr::Call(func, args) => {
                let a = args[0].eval(values, t);
                match func {
                    Func::Sin => a.sin(),
                    Func::Cos => a.cos(),
                    Func::Tan => a.tan(),
                    Func::Atan => a.atan(),
                    Func::Exp => a.exp(),
                    Func::Ln => a.ln(),
                    Func::Log10 => a.log10(),
                    Func::Sqrt => a.sqrt(),
                    Func::Abs => a.abs(),
                    Func::Tanh => a.tanh(),
                    Func::Sign => {
                        if a == 0.0 {
                            0.0
                        } else {
                            a.signum()
                        }
                    }
                    Func::Min => a.min(args[1].eval(values, t)),
                    Func::Max => a.max(args[1].eval(values, t)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn evaluates_symbol_lookup_and_arithmetic() {
        // 2 * x + y with x = 3, y = 4
        let expr = Expr::Binary(
            BinaryOp::Add,
            Box::new(Expr::Binary(
                BinaryOp::Mul,
                Box::new(Expr::Number(2.0)),
                Box::new(Expr::Symbol(0)),
            )),
            Box::new(Expr::Symbol(1)),
        );
        assert!(f64_approx_equal(expr.eval(&[3.0, 4.0], 0.0), 10.0));
    }

    #[test]
    fn time_evaluates_to_the_given_instant() {
        let expr = Expr::Binary(
            BinaryOp::Mul,
            Box::new(Expr::Time),
            Box::new(Expr::Number(2.0)),
        );
        assert!(f64_approx_equal(expr.eval(&[], 1.5), 3.0));
    }

    #[test]
    fn sign_of_zero_is_zero() {
        let expr = Expr::Call(Func::Sign, vec![Expr::Number(0.0)]);
        assert_eq!(expr.eval(&[], 0.0), 0.0);
        let expr = Expr::Call(Func::Sign, vec![Expr::Number(-3.0)]);
        assert_eq!(expr.eval(&[], 0.0), -1.0);
    }

    #[test]
    fn two_argument_functions_use_both_operands() {
        let expr = Expr::Call(Func::Max, vec![Expr::Symbol(0), Expr::Number(1.0)]);
        assert_eq!(expr.eval(&[5.0], 0.0), 5.0);
        assert_eq!(expr.eval(&[-5.0], 0.0), 1.0);
    }

    #[test]
    fn division_by_zero_produces_infinity_not_panic() {
        let expr = Expr::Binary(
            BinaryOp::Div,
            Box::new(Expr::Number(1.0)),
            Box::new(Expr::Number(0.0)),
        );
        assert!(expr.eval(&[], 0.0).is_infinite());
    }
}
