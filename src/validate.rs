//! Structural invariant gate
//!
//! A snapshot of the body skeleton is taken before and after a batch of
//! operations. The observed change must match the change the applied
//! operations declared; anything else aborts before the output is
//! written.

use crate::document::Body;
use crate::error::{Error, Result};

/// Body skeleton at a point in time
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructuralSnapshot {
    /// Direct body children, section properties included
    pub body_children: usize,
    /// Top-level tables
    pub tables: usize,
    /// Ordered child-tag signature
    pub signature: String,
}

impl StructuralSnapshot {
    /// Capture the current body skeleton
    pub fn take(body: &Body) -> Self {
        StructuralSnapshot {
            body_children: body.child_count(),
            tables: body.table_count(),
            signature: body.signature(),
        }
    }
}

/// Structural change a batch of applied operations declares
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExpectedDelta {
    pub children: i64,
    pub tables: i64,
    /// How many applied ops declared a structural change. A delete plus an
    /// insert nets to zero counts but is still a structural batch.
    pub structural_ops: u32,
}

impl ExpectedDelta {
    /// Declared change of one structural operation
    pub fn structural(children: i64, tables: i64) -> Self {
        ExpectedDelta {
            children,
            tables,
            structural_ops: 1,
        }
    }

    /// Accumulate another operation's declared change
    pub fn add(&mut self, other: ExpectedDelta) {
        self.children += other.children;
        self.tables += other.tables;
        self.structural_ops += other.structural_ops;
    }

    /// Whether the batch declared no structural change at all
    pub fn is_zero(&self) -> bool {
        self.structural_ops == 0
    }
}

/// Check the observed change against the declared one.
///
/// A batch that declared zero structural change must also leave the
/// child-tag signature identical; reordering without a count change is
/// still a violation.
pub fn validate(
    before: &StructuralSnapshot,
    after: &StructuralSnapshot,
    expected: ExpectedDelta,
) -> Result<()> {
    let child_delta = after.body_children as i64 - before.body_children as i64;
    if child_delta != expected.children {
        return Err(Error::InvariantViolation(format!(
            "body child count changed by {child_delta}, expected {}",
            expected.children
        )));
    }

    let table_delta = after.tables as i64 - before.tables as i64;
    if table_delta != expected.tables {
        return Err(Error::InvariantViolation(format!(
            "table count changed by {table_delta}, expected {}",
            expected.tables
        )));
    }

    if expected.is_zero() && before.signature != after.signature {
        return Err(Error::InvariantViolation(format!(
            "structure changed without a declared insert or delete: {:?} -> {:?}",
            before.signature, after.signature
        )));
    }

    log::debug!(
        "structure validated: {} children ({:+}), {} tables ({:+})",
        after.body_children,
        child_delta,
        after.tables,
        table_delta
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(children: usize, tables: usize, signature: &str) -> StructuralSnapshot {
        StructuralSnapshot {
            body_children: children,
            tables,
            signature: signature.to_string(),
        }
    }

    #[test]
    fn test_matching_delta_passes() {
        let before = snapshot(3, 0, "p p sectPr");
        let after = snapshot(4, 1, "p p tbl sectPr");
        let expected = ExpectedDelta::structural(1, 1);
        assert!(validate(&before, &after, expected).is_ok());
    }

    #[test]
    fn test_undeclared_growth_fails() {
        let before = snapshot(3, 0, "p p sectPr");
        let after = snapshot(4, 0, "p p p sectPr");
        let result = validate(&before, &after, ExpectedDelta::default());
        assert!(matches!(result, Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_zero_delta_signature_change_fails() {
        let before = snapshot(3, 1, "p tbl sectPr");
        let after = snapshot(3, 1, "tbl p sectPr");
        let result = validate(&before, &after, ExpectedDelta::default());
        assert!(matches!(result, Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_net_zero_structural_batch_may_reshape() {
        // a delete plus an insert nets to zero counts; the signature is
        // allowed to differ because structural ops were declared
        let before = snapshot(4, 1, "p tbl p sectPr");
        let after = snapshot(4, 1, "p p tbl sectPr");
        let mut expected = ExpectedDelta::structural(-1, -1);
        expected.add(ExpectedDelta::structural(1, 1));
        assert!(validate(&before, &after, expected).is_ok());
    }

    #[test]
    fn test_in_place_edit_passes() {
        let before = snapshot(3, 1, "p tbl sectPr");
        let after = before.clone();
        assert!(validate(&before, &after, ExpectedDelta::default()).is_ok());
    }
}
