use crate::types::DocumentMeta;

use super::ControllerError;

/// Documents uploaded for the run being prepared, and the requested shortlist size.
#[derive(Debug, Clone)]
pub struct UploadSession {
    jd: Option<DocumentMeta>,
    resumes: Vec<DocumentMeta>,
    top_n: usize,
    default_top_n: usize,
}

impl UploadSession {
    pub fn new(default_top_n: usize) -> Self {
        let default_top_n = default_top_n.max(1);
        Self {
            jd: None,
            resumes: Vec::new(),
            top_n: default_top_n,
            default_top_n,
        }
    }

    pub fn jd(&self) -> Option<&DocumentMeta> {
        self.jd.as_ref()
    }

    pub fn resumes(&self) -> &[DocumentMeta] {
        &self.resumes
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// A new job description starts a fresh session.
    pub fn begin(&mut self, jd: DocumentMeta) {
        self.jd = Some(jd);
        self.resumes.clear();
        self.top_n = self.default_top_n;
    }

    pub fn add_resumes(&mut self, docs: impl IntoIterator<Item = DocumentMeta>) {
        for doc in docs {
            if !self.resumes.iter().any(|r| r.id == doc.id) {
                self.resumes.push(doc);
            }
        }
    }

    pub fn set_top_n(&mut self, n: usize) -> Result<(), ControllerError> {
        if n == 0 {
            return Err(ControllerError::InvalidShortlistSize(n));
        }
        self.top_n = n;
        Ok(())
    }

    /// The shortlist size sent with a launch: never more than the resumes on hand.
    pub fn effective_top_n(&self) -> usize {
        self.top_n.min(self.resumes.len()).max(1)
    }

    pub fn clear(&mut self) {
        self.jd = None;
        self.resumes.clear();
        self.top_n = self.default_top_n;
    }
}
