use crate::storage::Record;

/// Outcome of one nested write request.
///
/// Mirrors the two-valued contract the surrounding framework expects from a
/// write endpoint: the persisted root record plus a success flag. When the
/// root entity itself fails validation there is no persisted record to hand
/// back, so `record` is `None` and the collaborator's validation messages
/// ride along for error-document rendering.
#[derive(Debug)]
pub struct WriteOutcome {
    record: Option<Record>,
    success: bool,
    violations: Vec<String>,
}

impl WriteOutcome {
    pub(crate) fn persisted(record: Record) -> Self {
        Self {
            record: Some(record),
            success: true,
            violations: Vec::new(),
        }
    }

    pub(crate) fn invalid(violations: Vec<String>) -> Self {
        Self {
            record: None,
            success: false,
            violations,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    pub fn into_record(self) -> Option<Record> {
        self.record
    }

    /// Validation messages from the storage collaborator; empty on success.
    pub fn violations(&self) -> &[String] {
        &self.violations
    }
}
