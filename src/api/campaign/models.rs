use actix_multipart::form::{bytes::Bytes, text::Text, MultipartForm};
use serde::Deserialize;
use validator::Validate;

use crate::campaign::StageTrigger;

/// Roster upload: a campaign name and a CSV file
#[derive(MultipartForm)]
pub struct UploadForm {
    pub name: Text<String>,
    pub file: Bytes,
}

/// Campaign metadata checked before the roster is ingested
#[derive(Debug, Validate)]
pub struct NewCampaign {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Please enter a list name"
    ))]
    pub name: String,
}

impl NewCampaign {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
        }
    }
}

/// Body of an action request
#[derive(Deserialize, Debug, Validate)]
pub struct ActionRequest {
    pub trigger: StageTrigger,
}

/// Paging parameters for the campaign listing
#[derive(Deserialize, Debug, Validate)]
pub struct ListQuery {
    #[validate(range(
        min = 1,
        max = 100,
        message = "Limit must be between 1 and 100"
    ))]
    pub limit: Option<i64>,

    /// Id of the last campaign on the previous page
    pub cursor: Option<i32>,
}

impl ListQuery {
    pub const DEFAULT_LIMIT: i64 = 100;

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_fail_validation() {
        assert!(NewCampaign::new("   ").validate().is_err());
        assert!(NewCampaign::new("Winter Drive").validate().is_ok());
        assert_eq!(NewCampaign::new("  Winter Drive ").name, "Winter Drive");
    }

    #[test]
    fn limit_is_bounded() {
        let query = ListQuery { limit: Some(101), cursor: None };
        assert!(query.validate().is_err());
        let query = ListQuery { limit: None, cursor: Some(7) };
        assert!(query.validate().is_ok());
        assert_eq!(query.limit(), ListQuery::DEFAULT_LIMIT);
    }
}
