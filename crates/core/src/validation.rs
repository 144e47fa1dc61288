//! Request validation for post drafts.
//!
//! A single [`PostValidator`] is built when the process starts and shared
//! read-only by every request handler. The field rules themselves are
//! declared on [`NewPost`] with the `validator` derive.

use validator::Validate;

use crate::error::{DomainError, DomainResult};
use crate::post::NewPost;

/// Immutable validator for client-supplied post content.
#[derive(Debug, Clone, Default)]
pub struct PostValidator {
    _private: (),
}

impl PostValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `title` and `body` are both present and non-empty.
    ///
    /// On failure the error lists the offending fields in a stable order.
    pub fn validate(&self, draft: &NewPost) -> DomainResult<()> {
        let Err(errors) = draft.validate() else {
            return Ok(());
        };

        let mut fields = errors
            .field_errors()
            .keys()
            .map(|k| k.to_string())
            .collect::<Vec<_>>();
        fields.sort();

        tracing::debug!(fields = ?fields, "post draft rejected");
        Err(DomainError::missing_fields(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_complete_draft() {
        let v = PostValidator::new();
        assert!(v.validate(&NewPost::new("New Post", "New Content")).is_ok());
    }

    #[test]
    fn rejects_missing_title() {
        let v = PostValidator::new();
        let err = v.validate(&NewPost::new("", "a post")).unwrap_err();
        assert_eq!(err, DomainError::MissingFields(vec!["title".to_string()]));
    }

    #[test]
    fn rejects_missing_body() {
        let v = PostValidator::new();
        let err = v.validate(&NewPost::new("a title", "")).unwrap_err();
        assert_eq!(err, DomainError::MissingFields(vec!["body".to_string()]));
    }

    #[test]
    fn reports_both_fields_sorted() {
        let v = PostValidator::new();
        let err = v.validate(&NewPost::default()).unwrap_err();
        assert_eq!(
            err,
            DomainError::MissingFields(vec!["body".to_string(), "title".to_string()])
        );
        assert_eq!(err.to_string(), "missing required fields: body, title");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: any draft with non-empty title and body passes.
        #[test]
        fn non_empty_drafts_always_pass(
            title in ".{1,64}",
            body in ".{1,256}",
        ) {
            let v = PostValidator::new();
            prop_assert!(v.validate(&NewPost::new(title, body)).is_ok());
        }

        /// Property: an empty title is rejected whatever the body holds.
        #[test]
        fn empty_title_always_fails(body in ".{0,64}") {
            let v = PostValidator::new();
            let err = v.validate(&NewPost::new("", body)).unwrap_err();
            let DomainError::MissingFields(fields) = err else {
                panic!("unexpected error variant");
            };
            prop_assert!(fields.contains(&"title".to_string()));
        }
    }
}
