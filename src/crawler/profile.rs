//! Account lookup performed before a crawl
//!
//! Two calls with `per_page=0` read the account block and the sizes of
//! both listings without transferring any items.

use crate::crawler::fetcher::ApiClient;
use crate::crawler::pages::pages_needed;
use crate::model::{CrawlMode, UserProfile};
use crate::HarvestError;

/// Result of looking up one user
#[derive(Debug)]
pub struct LookupOutcome {
    pub user: String,
    pub result: Result<UserProfile, HarvestError>,
}

/// Looks up an account by username or nsid
///
/// # Arguments
///
/// * `api` - The API client
/// * `user` - Username or nsid of the account
/// * `page_size` - Page size used to derive the page counts
///
/// # Returns
///
/// * `Ok(UserProfile)` - The account with both listing sizes filled in
/// * `Err(HarvestError)` - Either call failed or returned no account block
pub async fn lookup_profile(
    api: &ApiClient,
    user: &str,
    page_size: u32,
) -> Result<UserProfile, HarvestError> {
    let photos = api
        .call(CrawlMode::Photos.api_method(), &summary_params(user))
        .await
        .map_err(|e| e.into_harvest_error("user lookup"))?;

    let info = photos.user.ok_or_else(|| HarvestError::Remote {
        operation: "user lookup".to_string(),
        message: format!("no account block returned for '{}'", user),
    })?;
    let total_items = photos.photos.map(|p| p.total).unwrap_or(0);
    tracing::info!("User {} ({}) has {} items", info.username, info.nsid, total_items);

    let favorites = api
        .call(CrawlMode::Favorites.api_method(), &summary_params(&info.nsid))
        .await
        .map_err(|e| e.into_harvest_error("favorites lookup"))?;
    let favorite_count = favorites.photos.map(|p| p.total).unwrap_or(0);
    tracing::info!("User {} has {} favorites", info.nsid, favorite_count);

    Ok(UserProfile {
        username: if info.username.is_empty() {
            user.to_string()
        } else {
            info.username
        },
        nsid: info.nsid,
        path_alias: info.path_alias.filter(|alias| !alias.is_empty()),
        is_pro: info.ispro,
        is_ad_free: info.is_ad_free,
        is_deleted: info.is_deleted,
        total_items,
        total_pages: pages_needed(total_items, page_size),
        favorite_count,
        favorite_pages: pages_needed(favorite_count, page_size),
        date_created: info.datecreate,
    })
}

fn summary_params(user_id: &str) -> [(&'static str, String); 4] {
    [
        ("per_page", "0".to_string()),
        ("page", "0".to_string()),
        ("get_user_info", "1".to_string()),
        ("user_id", user_id.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use std::collections::HashMap;
    use std::time::Duration;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_api(endpoint: &str) -> ApiClient {
        let config = ApiConfig {
            csrf: "c".to_string(),
            api_key: "k".to_string(),
            cookie: None,
            headers: HashMap::new(),
            endpoint: endpoint.to_string(),
            media_base_url: "http://media.test".to_string(),
        };
        ApiClient::new(&config, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_lookup_profile() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("method", "flickr.people.getPhotos"))
            .and(query_param("user_id", "someone"))
            .and(query_param("get_user_info", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"user": {"nsid": "1@N01", "username": "someone", "path_alias": "some1",
                             "ispro": 1, "is_ad_free": 0, "is_deleted": 0, "datecreate": "1136214245"},
                    "photos": {"total": 1200, "photo": []}, "stat": "ok"}"#,
            ))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(query_param("method", "flickr.favorites.getList"))
            .and(query_param("user_id", "1@N01"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"photos": {"total": "501", "photo": []}, "stat": "ok"}"#,
            ))
            .mount(&server)
            .await;

        let profile = lookup_profile(&create_api(&server.uri()), "someone", 500)
            .await
            .unwrap();

        assert_eq!(profile.nsid, "1@N01");
        assert_eq!(profile.username, "someone");
        assert_eq!(profile.path_alias.as_deref(), Some("some1"));
        assert!(profile.is_pro);
        assert_eq!(profile.total_items, 1200);
        assert_eq!(profile.total_pages, 3);
        assert_eq!(profile.favorite_count, 501);
        assert_eq!(profile.favorite_pages, 2);
        assert_eq!(profile.date_created.as_deref(), Some("1136214245"));
    }

    #[tokio::test]
    async fn test_lookup_unknown_user_fails() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"stat": "fail", "code": 1, "message": "User not found"}"#,
            ))
            .mount(&server)
            .await;

        let result = lookup_profile(&create_api(&server.uri()), "nobody", 500).await;

        match result {
            Err(HarvestError::Remote { operation, message }) => {
                assert_eq!(operation, "user lookup");
                assert!(message.contains("User not found"));
            }
            other => panic!("expected remote error, got {:?}", other),
        }
    }
}
