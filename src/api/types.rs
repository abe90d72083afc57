//! Request and response payloads for the Civic backend. Credential payloads
//! carry plaintext passwords and tokens, so they must never be logged.

use serde::{Deserialize, Serialize};

/// Identity record returned by the backend. Replaced wholesale on refresh.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Clone, Serialize)]
pub struct SignupRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of a successful `/auth/login` or `/auth/signup`.
#[derive(Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: User,
}

#[derive(Clone, Debug, Serialize)]
pub struct QueryRequest<'a> {
    pub question: &'a str,
    pub language: &'a str,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct QueryResponse {
    pub answer: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_ignores_unknown_fields() {
        let user: User = serde_json::from_value(json!({
            "id": "u-1",
            "email": "asha@example.com",
            "name": "Asha",
            "created_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(user.id, "u-1");
        assert_eq!(user.name, "Asha");
    }

    #[test]
    fn query_response_language_is_optional() {
        let response: QueryResponse = serde_json::from_value(json!({ "answer": "42" })).unwrap();
        assert_eq!(response.answer, "42");
        assert_eq!(response.language, None);
    }

    #[test]
    fn signup_request_field_names() {
        let value = serde_json::to_value(SignupRequest {
            name: "Asha",
            email: "asha@example.com",
            password: "pw",
        })
        .unwrap();
        assert_eq!(
            value,
            json!({ "name": "Asha", "email": "asha@example.com", "password": "pw" })
        );
    }
}
