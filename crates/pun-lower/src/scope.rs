//! Subject scope and temporary allocation
//!
//! A [`SubjectScope`] belongs to exactly one match statement being lowered.
//! It tracks which variable currently holds the value under test and hands
//! out deterministic names for everything the lowering introduces.

/// Variable holding the evaluated match subject
pub const SUBJECT: &str = "__match_subject";

/// Prefix of the attribute-manifest variables of class patterns
pub const MANIFEST: &str = "__match_args";

/// Case selector of the statement strategy
pub const CASE_SELECTOR: &str = "__match_case";

/// Prefix of the or-pattern flags of the statement strategy
pub const ALT_FLAG: &str = "__match_alt";

#[derive(Debug)]
pub struct SubjectScope {
    /// Temporaries entered below the root subject, innermost last
    stack: Vec<String>,
    next_temp: usize,
    next_flag: usize,
}

impl SubjectScope {
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            next_temp: 1,
            next_flag: 1,
        }
    }

    /// Starts a new case: counters restart at 1
    pub fn reset(&mut self) {
        self.stack.clear();
        self.next_temp = 1;
        self.next_flag = 1;
    }

    /// Variable currently under test
    pub fn subject(&self) -> &str {
        self.stack.last().map(String::as_str).unwrap_or(SUBJECT)
    }

    /// Number of subjects on the stack, the root subject included
    pub fn depth(&self) -> usize {
        self.stack.len() + 1
    }

    /// Allocates the next temporary and makes it the current subject
    pub fn push_temp(&mut self) -> String {
        let name = format!("{}{}", SUBJECT, self.next_temp);
        self.next_temp += 1;
        self.stack.push(name.clone());
        name
    }

    /// Returns to the parent subject. The root subject is never popped.
    pub fn pop(&mut self) {
        self.stack.pop();
    }

    /// Manifest variable for a class pattern tested against the current
    /// subject. Each nesting level gets its own so an inner class pattern
    /// leaves the manifest of its parent intact.
    pub fn manifest(&self) -> String {
        match self.depth() {
            1 => MANIFEST.to_string(),
            depth => format!("{}{}", MANIFEST, depth),
        }
    }

    /// Allocates the next or-pattern flag
    pub fn next_flag(&mut self) -> String {
        let name = format!("{}{}", ALT_FLAG, self.next_flag);
        self.next_flag += 1;
        name
    }
}

impl Default for SubjectScope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_subject() {
        let scope = SubjectScope::new();
        assert_eq!(scope.subject(), "__match_subject");
        assert_eq!(scope.depth(), 1);
        assert_eq!(scope.manifest(), "__match_args");
    }

    #[test]
    fn test_sibling_temps_see_parent() {
        let mut scope = SubjectScope::new();

        assert_eq!(scope.push_temp(), "__match_subject1");
        assert_eq!(scope.manifest(), "__match_args2");
        scope.pop();

        assert_eq!(scope.subject(), "__match_subject");
        assert_eq!(scope.push_temp(), "__match_subject2");
        assert_eq!(scope.push_temp(), "__match_subject3");
        assert_eq!(scope.manifest(), "__match_args3");
        scope.pop();
        assert_eq!(scope.subject(), "__match_subject2");
    }

    #[test]
    fn test_pop_never_drops_root() {
        let mut scope = SubjectScope::new();
        scope.pop();
        assert_eq!(scope.subject(), "__match_subject");
    }

    #[test]
    fn test_reset_restarts_counters() {
        let mut scope = SubjectScope::new();
        scope.push_temp();
        scope.next_flag();

        scope.reset();

        assert_eq!(scope.subject(), "__match_subject");
        assert_eq!(scope.push_temp(), "__match_subject1");
        assert_eq!(scope.next_flag(), "__match_alt1");
    }
}
