use crate::database::{MongoDB, USERS_COLLECTION};
use crate::models::User;
use crate::utils::{crypto, AppError};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,           // user_id
    pub email: String,
    pub name: String,
    pub iat: usize,            // issued at
    pub exp: usize,            // expiration
    pub jti: String,           // JWT ID
}

// Request/Response structures
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthData {
    pub name: String,
    pub email: String,
    pub token: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub data: AuthData,
    pub message: String,
    pub status: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ResetPasswordResponse {
    pub message: String,
    pub status: String,
}

fn get_jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "default-secret-change-me".to_string())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// Mirrors the request-shape rules the frontend relies on: name 3..=50 chars,
// email of the form <something>@<something>, password at least 6 chars.
fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    }
}

fn validate_register(request: &RegisterRequest) -> Result<(), AppError> {
    let name_len = request.name.trim().chars().count();
    if !(3..=50).contains(&name_len) {
        return Err(AppError::InvalidRequest(
            "Name must be between 3 and 50 characters".to_string(),
        ));
    }
    if !is_valid_email(&normalize_email(&request.email)) {
        return Err(AppError::InvalidRequest("Invalid email address".to_string()));
    }
    if request.password.chars().count() < 6 {
        return Err(AppError::InvalidRequest(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    Ok(())
}

// Generate JWT token (30 minute expiry)
pub fn generate_token(user: &User) -> Result<String, AppError> {
    generate_token_with_expiry(user, Duration::minutes(ACCESS_TOKEN_EXPIRE_MINUTES))
}

pub fn generate_token_with_expiry(user: &User, expires_in: Duration) -> Result<String, AppError> {
    let iat = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + expires_in).timestamp() as usize;
    let jti = Uuid::new_v4().to_string();

    let claims = Claims {
        sub: user.user_id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        iat,
        exp,
        jti,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_jwt_secret().as_ref()),
    )
    .map_err(|e| AppError::Unauthorized(format!("Failed to generate token: {}", e)))
}

// Verify JWT token (signature + expiry)
pub fn verify_token(token: &str) -> Result<Claims, AppError> {
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_jwt_secret().as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

fn is_duplicate_key_error(e: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == 11000
    )
}

// User registration: normalize email, reject duplicates, hash, insert, issue token
pub async fn register(db: &MongoDB, request: &RegisterRequest) -> Result<AuthResponse, AppError> {
    validate_register(request)?;

    let collection = db.collection::<User>(USERS_COLLECTION);
    let email = normalize_email(&request.email);

    // Friendly pre-check; the unique index on email is the real guarantee
    if collection
        .find_one(doc! { "email": &email })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?
        .is_some()
    {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let hashed_password = crypto::hash_password(&request.password)
        .map_err(AppError::InvalidRequest)?;

    let new_user = User {
        _id: None,
        user_id: ObjectId::new().to_hex(),
        name: request.name.trim().to_string(),
        email: email.clone(),
        password: Some(hashed_password),
        created_at: Some(BsonDateTime::now()),
        updated_at: Some(BsonDateTime::now()),
    };

    collection.insert_one(&new_user).await.map_err(|e| {
        if is_duplicate_key_error(&e) {
            // Lost the race against a concurrent registration
            AppError::Conflict("Email already registered".to_string())
        } else {
            AppError::DatabaseError(format!("Failed to create user: {}", e))
        }
    })?;

    let token = generate_token(&new_user)?;

    log::info!("✅ User registered successfully: {}", email);

    Ok(AuthResponse {
        data: AuthData {
            name: new_user.name,
            email: new_user.email,
            token,
        },
        message: "User registered and logged in successfully".to_string(),
        status: "success".to_string(),
    })
}

// User login: look up by email, verify password, issue token
pub async fn login(db: &MongoDB, request: &LoginRequest) -> Result<AuthResponse, AppError> {
    let collection = db.collection::<User>(USERS_COLLECTION);
    let email = normalize_email(&request.email);

    let user = collection
        .find_one(doc! { "email": &email })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Email not found".to_string()))?;

    if !crypto::verify_password(&request.password, user.password.as_deref()) {
        return Err(AppError::Unauthorized("Invalid password".to_string()));
    }

    let token = generate_token(&user)?;

    Ok(AuthResponse {
        data: AuthData {
            name: user.name,
            email: user.email,
            token,
        },
        message: "User logged in successfully".to_string(),
        status: "success".to_string(),
    })
}

// Password reset: look up by email, overwrite stored hash
pub async fn reset_password(
    db: &MongoDB,
    request: &ResetPasswordRequest,
) -> Result<ResetPasswordResponse, AppError> {
    if request.new_password.chars().count() < 6 {
        return Err(AppError::InvalidRequest(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let collection = db.collection::<User>(USERS_COLLECTION);
    let email = normalize_email(&request.email);

    let user = collection
        .find_one(doc! { "email": &email })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Email not found".to_string()))?;

    let hashed_password = crypto::hash_password(&request.new_password)
        .map_err(AppError::InvalidRequest)?;

    collection
        .update_one(
            doc! { "user_id": &user.user_id },
            doc! { "$set": { "password": hashed_password, "updated_at": BsonDateTime::now() } },
        )
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to update password: {}", e)))?;

    log::info!("✅ Password reset for: {}", email);

    Ok(ResetPasswordResponse {
        message: format!("Password has been reset for {}", email),
        status: "success".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            _id: None,
            user_id: "6717f2a9c1d4e53b9a0f1b2c".to_string(),
            name: "Alice Example".to_string(),
            email: "alice@example.com".to_string(),
            password: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_token_roundtrip_preserves_identity() {
        let user = sample_user();
        let token = generate_token(&user).unwrap();
        let claims = verify_token(&token).unwrap();

        assert_eq!(claims.sub, user.user_id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.name, user.name);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let user = sample_user();
        // Past the default 60s validation leeway
        let token = generate_token_with_expiry(&user, Duration::minutes(-5)).unwrap();
        assert!(verify_token(&token).is_err());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let user = sample_user();
        let token = generate_token(&user).unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });
        assert!(verify_token(&tampered).is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM  "), "alice@example.com");
        assert_eq!(normalize_email("bob@host"), "bob@host");
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("user@host"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@host"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user name@host"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_register_request_validation() {
        let ok = RegisterRequest {
            name: "Bob Smith".to_string(),
            email: "bob@example.com".to_string(),
            password: "secret123".to_string(),
        };
        assert!(validate_register(&ok).is_ok());

        let short_name = RegisterRequest {
            name: "Bo".to_string(),
            email: "bob@example.com".to_string(),
            password: "secret123".to_string(),
        };
        assert!(validate_register(&short_name).is_err());

        let short_password = RegisterRequest {
            name: "Bob Smith".to_string(),
            email: "bob@example.com".to_string(),
            password: "12345".to_string(),
        };
        assert!(validate_register(&short_password).is_err());
    }
}
