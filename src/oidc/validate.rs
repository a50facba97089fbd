//! ID-token validator (C5).
//!
//! Grounded on `parthspatel-glyph`'s `libs/auth/src/jwks.rs` and `jwt.rs`
//! (`jsonwebtoken::decode_header`, RSA JWK materialization, leeway-based
//! `Validation`), generalized per `pkg/oidc/validation.go`: RSA-only
//! algorithms, `kid`-keyed lookup, issuer check, 300-second clock skew, and
//! audience validation that is skipped unless an expected audience is given.

use jsonwebtoken::jwk::{AlgorithmParameters, JwkSet};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde_json::Value;

use crate::error::{OidcError, Result};
use crate::model::WellKnownConfiguration;

const CLOCK_SKEW_LEEWAY_SECONDS: u64 = 300;

fn is_rsa_family(alg: Algorithm) -> bool {
    matches!(alg, Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512)
}

/// Fetches the JWKS document, verifies `jwt`'s RSA signature against the key
/// named by its `kid`, and enforces issuer + clock-skew + (optionally)
/// audience. Returns the decoded claim set.
pub async fn validate_id_token(
    client: &Client,
    jwt: &str,
    cfg: &WellKnownConfiguration,
    expected_issuer: &str,
    expected_audience: Option<&str>,
) -> Result<Value> {
    let header = decode_header(jwt)
        .map_err(|e| OidcError::TokenInvalid { reason: format!("malformed header: {e}") })?;

    if !is_rsa_family(header.alg) {
        return Err(OidcError::TokenInvalid { reason: format!("unsupported algorithm {:?}", header.alg) });
    }

    let kid = header.kid.ok_or_else(|| OidcError::TokenInvalid { reason: "no-kid".into() })?;

    let jwks: JwkSet = client
        .get(&cfg.jwks_uri)
        .send()
        .await
        .map_err(|e| OidcError::TokenInvalid { reason: format!("jwks fetch failed: {e}") })?
        .json()
        .await
        .map_err(|e| OidcError::TokenInvalid { reason: format!("invalid jwks body: {e}") })?;

    let jwk = jwks.find(&kid).ok_or_else(|| OidcError::TokenInvalid { reason: "unknown-kid".into() })?;

    let decoding_key = match &jwk.algorithm {
        AlgorithmParameters::RSA(params) => DecodingKey::from_rsa_components(&params.n, &params.e)
            .map_err(|e| OidcError::TokenInvalid { reason: format!("bad rsa jwk: {e}") })?,
        _ => return Err(OidcError::TokenInvalid { reason: "wrong-alg".into() }),
    };

    let mut validation = Validation::new(header.alg);
    validation.leeway = CLOCK_SKEW_LEEWAY_SECONDS;
    validation.set_issuer(&[expected_issuer]);
    match expected_audience {
        Some(aud) => validation.set_audience(&[aud]),
        None => validation.validate_aud = false,
    }

    let decoded = decode::<Value>(jwt, &decoding_key, &validation)
        .map_err(|e| OidcError::TokenInvalid { reason: format!("signature: {e}") })?;

    Ok(decoded.claims)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use rand::rngs::OsRng;
    use rsa::pkcs1::EncodeRsaPrivateKey;
    use rsa::traits::PublicKeyParts;
    use rsa::RsaPrivateKey;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn cfg(jwks_uri: String, issuer: String) -> WellKnownConfiguration {
        WellKnownConfiguration {
            authorization_endpoint: format!("{issuer}/authorize"),
            token_endpoint: format!("{issuer}/token"),
            jwks_uri,
            issuer,
        }
    }

    #[tokio::test]
    async fn accepts_a_correctly_signed_token_and_rejects_wrong_issuer() {
        let mut rng = OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public_key = private_key.to_public_key();

        let n = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
        let e = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());

        let server = MockServer::start().await;
        let jwks_body = json!({
            "keys": [{
                "kty": "RSA",
                "kid": "key-1",
                "use": "sig",
                "alg": "RS256",
                "n": n,
                "e": e,
            }]
        });
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body))
            .mount(&server)
            .await;

        let mut header = Header::new(jsonwebtoken::Algorithm::RS256);
        header.kid = Some("key-1".to_string());
        let now = Utc::now().timestamp();
        let claims = json!({
            "iss": "https://id.example",
            "sub": "user-1",
            "exp": now + 3600,
            "iat": now,
        });
        let pem = private_key.to_pkcs1_pem(rsa::pkcs1::LineEnding::LF).unwrap();
        let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap();
        let jwt = encode(&header, &claims, &encoding_key).unwrap();

        let client = Client::new();
        let config = cfg(format!("{}/jwks", server.uri()), "https://id.example".to_string());

        let decoded = validate_id_token(&client, &jwt, &config, "https://id.example", None).await.unwrap();
        assert_eq!(decoded["sub"], "user-1");

        let err = validate_id_token(&client, &jwt, &config, "https://wrong.example", None).await.unwrap_err();
        assert!(matches!(err, OidcError::TokenInvalid { .. }));
    }
}
