use uuid::Uuid;

/// Who is making the request.
///
/// Built by the authentication layer from a validated token. It carries the
/// subject id only: capabilities are never attached here, they are resolved
/// from the stored identity's role when a privileged operation needs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityContext {
    subject_id: Uuid,
}

impl SecurityContext {
    #[must_use]
    pub fn builder() -> SecurityContextBuilder {
        SecurityContextBuilder::default()
    }

    /// Context for an unauthenticated caller (nil subject).
    #[must_use]
    pub fn anonymous() -> Self {
        SecurityContextBuilder::default().build()
    }

    #[must_use]
    pub fn subject_id(&self) -> Uuid {
        self.subject_id
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.subject_id.is_nil()
    }
}

#[derive(Default)]
pub struct SecurityContextBuilder {
    subject_id: Option<Uuid>,
}

impl SecurityContextBuilder {
    #[must_use]
    pub fn subject_id(mut self, subject_id: Uuid) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    #[must_use]
    pub fn build(self) -> SecurityContext {
        SecurityContext {
            subject_id: self.subject_id.unwrap_or_default(),
        }
    }
}
