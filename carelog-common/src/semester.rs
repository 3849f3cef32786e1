//! Semester scoping for record queries
//!
//! Most dated tables carry a nullable `id_semestre` column. Views are
//! scoped by the operator's current selection: a concrete semester id, or
//! no selection at all. No selection does NOT mean "all semesters" — it
//! means only the rows that predate semester tracking (null `id_semestre`).
//! The two views are disjoint: selecting a semester never returns legacy
//! rows, and the legacy view never returns rows tagged with any semester.
//!
//! The filter is an explicit value threaded through every query; the HTTP
//! layer reads it from the session row and passes it down.

/// The operator's current semester selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemesterFilter(pub Option<i64>);

impl SemesterFilter {
    /// Legacy-only view (rows with no semester assigned)
    pub fn none() -> Self {
        Self(None)
    }

    /// Scoped to one concrete semester
    pub fn semester(id: i64) -> Self {
        Self(Some(id))
    }

    /// SQL fragment completing an `id_semestre` comparison.
    ///
    /// `= ?` with one bind parameter when a semester is selected,
    /// `IS NULL` with none otherwise. Callers append this to
    /// `... id_semestre ` and bind via [`SemesterFilter::bind`].
    pub fn predicate(&self) -> &'static str {
        match self.0 {
            Some(_) => "= ?",
            None => "IS NULL",
        }
    }

    /// The bind parameter for [`SemesterFilter::predicate`], if any
    pub fn bind(&self) -> Option<i64> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_semester_binds_one_param() {
        let filter = SemesterFilter::semester(4);
        assert_eq!(filter.predicate(), "= ?");
        assert_eq!(filter.bind(), Some(4));
    }

    #[test]
    fn no_selection_is_null_with_no_binds() {
        let filter = SemesterFilter::none();
        assert_eq!(filter.predicate(), "IS NULL");
        assert_eq!(filter.bind(), None);
    }
}
