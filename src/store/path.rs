use crate::error::{Error, Result};

/// Canonicalizes an externally supplied secret path: trims, collapses
/// repeated slashes, and guarantees a single leading `/`.
pub fn normalize_path(path: &str) -> Result<String> {
    let path = path.trim();

    if path.is_empty() {
        return Err(Error::BadRequest("Path cannot be empty".to_string()));
    }

    let segments: Vec<&str> = path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() {
        return Err(Error::BadRequest("Path cannot be empty".to_string()));
    }

    for segment in &segments {
        validate_segment(segment)?;
    }

    Ok(format!("/{}", segments.join("/")))
}

fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(Error::BadRequest(
            "Path segment cannot be empty".to_string(),
        ));
    }

    if segment.len() > 255 {
        return Err(Error::BadRequest(
            "Path segment cannot exceed 255 characters".to_string(),
        ));
    }

    const INVALID_CHARS: &[char] = &['\0', '\n', '\r', '/'];
    if segment.chars().any(|c| INVALID_CHARS.contains(&c)) {
        return Err(Error::BadRequest(
            "Path segment contains invalid characters".to_string(),
        ));
    }

    Ok(())
}

/// Builds scoped secret paths:
/// `/organizations/{org}[/teams/{team}[/users/{user}]][/...]/{secret}`.
#[derive(Debug, Clone)]
pub struct SecretPath {
    segments: Vec<String>,
}

impl SecretPath {
    pub fn organization(org_id: &str) -> Result<Self> {
        validate_segment(org_id)?;
        Ok(Self {
            segments: vec!["organizations".to_string(), org_id.to_string()],
        })
    }

    /// Organization scope, narrowed to a team when one is given.
    pub fn scope(org_id: &str, team_id: Option<&str>) -> Result<Self> {
        let path = Self::organization(org_id)?;
        match team_id {
            Some(team_id) => path.team(team_id),
            None => Ok(path),
        }
    }

    pub fn team(self, team_id: &str) -> Result<Self> {
        self.push("teams")?.push(team_id)
    }

    pub fn user(self, user_id: &str) -> Result<Self> {
        self.push("users")?.push(user_id)
    }

    pub fn mcp(self) -> Result<Self> {
        self.push("mcp")
    }

    pub fn custom_provider(self, provider_id: &str) -> Result<Self> {
        self.push("custom_providers")?.push(provider_id)
    }

    /// Full path of the secret named `name` in this scope.
    pub fn secret(self, name: &str) -> Result<String> {
        let path = self.push(name)?;
        Ok(format!("/{}", path.segments.join("/")))
    }

    fn push(mut self, segment: &str) -> Result<Self> {
        validate_segment(segment)?;
        self.segments.push(segment.to_string());
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_basic() {
        assert_eq!(normalize_path("organizations").unwrap(), "/organizations");
        assert_eq!(normalize_path("/organizations").unwrap(), "/organizations");
        assert_eq!(normalize_path("organizations/").unwrap(), "/organizations");
    }

    #[test]
    fn test_normalize_path_collapses_slashes() {
        assert_eq!(
            normalize_path("//organizations//o1//openai_api_key").unwrap(),
            "/organizations/o1/openai_api_key"
        );
    }

    #[test]
    fn test_normalize_path_empty_error() {
        assert!(normalize_path("").is_err());
        assert!(normalize_path("/").is_err());
        assert!(normalize_path("//").is_err());
    }

    #[test]
    fn test_org_and_team_paths() {
        assert_eq!(
            SecretPath::organization("o1")
                .unwrap()
                .secret("anthropic_api_key")
                .unwrap(),
            "/organizations/o1/anthropic_api_key"
        );
        assert_eq!(
            SecretPath::scope("o1", Some("t1"))
                .unwrap()
                .secret("anthropic_api_key")
                .unwrap(),
            "/organizations/o1/teams/t1/anthropic_api_key"
        );
    }

    #[test]
    fn test_user_mcp_path() {
        let path = SecretPath::organization("o1")
            .and_then(|p| p.team("t1"))
            .and_then(|p| p.user("u1"))
            .and_then(SecretPath::mcp)
            .and_then(|p| p.secret("mcp_server_s1"))
            .unwrap();
        assert_eq!(path, "/organizations/o1/teams/t1/users/u1/mcp/mcp_server_s1");
    }

    #[test]
    fn test_segment_with_slash_rejected() {
        assert!(SecretPath::organization("o1/../o2").is_err());
        assert!(SecretPath::scope("o1", Some("")).is_err());
        assert!(
            SecretPath::organization("o1")
                .unwrap()
                .secret("bad\nname")
                .is_err()
        );
    }
}
