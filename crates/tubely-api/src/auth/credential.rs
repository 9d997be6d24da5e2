use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingCredential,

    #[error("malformed authorization header")]
    MalformedHeader,

    #[error("unsupported authorization scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid access token: {0}")]
    InvalidToken(String),

    #[error("access token subject is not a user id")]
    InvalidSubject,
}

impl AuthError {
    /// Message safe to return to clients. Token validation details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::InvalidToken(_) | AuthError::InvalidSubject => {
                "Couldn't validate access token".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Credential carried in an `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential<'a> {
    Bearer(&'a str),
    ApiKey(&'a str),
}

impl<'a> Credential<'a> {
    pub fn parse(header: Option<&'a str>) -> Result<Self, AuthError> {
        let value = header
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(AuthError::MissingCredential)?;

        let (scheme, token) = value
            .split_once(char::is_whitespace)
            .ok_or(AuthError::MalformedHeader)?;
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MalformedHeader);
        }

        match scheme {
            "Bearer" => Ok(Credential::Bearer(token)),
            "ApiKey" => Ok(Credential::ApiKey(token)),
            other => Err(AuthError::UnsupportedScheme(other.to_string())),
        }
    }

    /// The bearer token, or an error for any other scheme.
    pub fn bearer(self) -> Result<&'a str, AuthError> {
        match self {
            Credential::Bearer(token) => Ok(token),
            Credential::ApiKey(_) => Err(AuthError::UnsupportedScheme("ApiKey".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearer() {
        assert_eq!(
            Credential::parse(Some("Bearer abc.def.ghi")),
            Ok(Credential::Bearer("abc.def.ghi"))
        );
        assert_eq!(
            Credential::parse(Some("  Bearer   tok  ")),
            Ok(Credential::Bearer("tok"))
        );
    }

    #[test]
    fn test_parse_api_key_is_not_a_bearer() {
        let credential = Credential::parse(Some("ApiKey secret")).unwrap();
        assert_eq!(credential, Credential::ApiKey("secret"));
        assert!(matches!(
            credential.bearer(),
            Err(AuthError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_parse_rejects_missing_and_malformed() {
        assert_eq!(Credential::parse(None), Err(AuthError::MissingCredential));
        assert_eq!(Credential::parse(Some("   ")), Err(AuthError::MissingCredential));
        assert_eq!(Credential::parse(Some("Bearer")), Err(AuthError::MalformedHeader));
        assert_eq!(
            Credential::parse(Some("Basic dXNlcjpwYXNz")),
            Err(AuthError::UnsupportedScheme("Basic".to_string()))
        );
    }

    #[test]
    fn test_client_message_hides_token_details() {
        let err = AuthError::InvalidToken("ExpiredSignature".to_string());
        assert!(!err.client_message().contains("Expired"));
        assert_eq!(
            AuthError::MissingCredential.client_message(),
            "missing authorization header"
        );
    }
}
