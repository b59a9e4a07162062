//! Operator binding powers for the expression parser.

/// Binding power for operators in Pratt parser style.
///
/// Using (left, right) pairs enables both left and right associativity:
/// - Left-associative: `left < right` (`a + b + c` = `(a + b) + c`)
/// - Right-associative: `left > right` (`a ? b : c ? d : e` = `a ? b : (c ? d : e)`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BindingPower {
	pub(crate) left: u8,
	pub(crate) right: u8,
}

impl BindingPower {
	pub(crate) const fn left(power: u8) -> Self {
		Self {
			left: power,
			right: power + 1,
		}
	}

	pub(crate) const fn right(power: u8) -> Self {
		Self {
			left: power + 1,
			right: power,
		}
	}
}

/// Higher numbers bind tighter.
pub(crate) mod prec {
	use super::BindingPower;

	pub(crate) const CONDITIONAL: BindingPower = BindingPower::right(6);
	pub(crate) const NULLISH: BindingPower = BindingPower::left(8);
	pub(crate) const LOGICAL_OR: BindingPower = BindingPower::left(10);
	pub(crate) const LOGICAL_AND: BindingPower = BindingPower::left(12);
	pub(crate) const EQUALITY: BindingPower = BindingPower::left(20);
	pub(crate) const RELATIONAL: BindingPower = BindingPower::left(22);
	pub(crate) const ADDITIVE: BindingPower = BindingPower::left(26);
	pub(crate) const MULTIPLICATIVE: BindingPower = BindingPower::left(28);

	/// Operand binding of prefix operators (`!`, `-`, `+`, `typeof`)
	pub(crate) const PREFIX: u8 = 32;
}
