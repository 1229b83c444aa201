use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use tracing::debug;
use vastrayl_types::claim::TimeLimited;

use crate::error::{Error, Result};

pub const MIN_SECRET_LEN: usize = 32;

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_ref()),
            decoding: DecodingKey::from_secret(secret.as_ref()),
        }
    }
}

pub struct TokenManager {
    keys: Keys,
    default_validity: std::time::Duration,
    header: Header,
    validation: Validation,
}

impl TokenManager {
    pub fn new(secret: impl AsRef<[u8]>, default_validity: std::time::Duration) -> Result<Self> {
        if secret.as_ref().len() < MIN_SECRET_LEN {
            return Err(Error::ShortSecret(MIN_SECRET_LEN));
        }
        Ok(Self {
            keys: Keys::new(secret),
            default_validity,
            header: Header::default(),
            validation: Validation::default(),
        })
    }

    pub fn issue(&self, mut claims: impl serde::Serialize + TimeLimited) -> Result<String> {
        let validity = std::time::SystemTime::now() + self.default_validity;
        claims.set_validity(validity);
        let token = encode(&self.header, &claims, &self.keys.encoding)?;
        Ok(token)
    }

    #[cfg(test)]
    pub fn issue_expired(&self, mut claims: impl serde::Serialize + TimeLimited) -> Result<String> {
        let validity = std::time::SystemTime::now() - self.default_validity;
        claims.set_validity(validity);
        let token = encode(&self.header, &claims, &self.keys.encoding)?;
        Ok(token)
    }

    pub fn validate<T>(&self, token: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let data = decode::<T>(token, &self.keys.decoding, &self.validation).inspect_err(|e| {
            debug!("Token rejected: {e}");
        })?;
        Ok(data.claims)
    }

    pub fn default_validity(&self) -> std::time::Duration {
        self.default_validity
    }
}

#[cfg(test)]
mod tests {
    use vastrayl_types::claim::ApiClaim;

    use super::*;

    const SECRET: &[u8; 32] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn test_token() {
        let claim = ApiClaim::new_expired("123");
        let manager = TokenManager::new(SECRET, std::time::Duration::from_secs(3600)).unwrap();
        let token = manager.issue(claim).unwrap();
        let res = manager.validate::<ApiClaim>(&token);
        assert!(res.is_ok());
        let claim = res.unwrap();
        assert_eq!(claim.sub, "123");
        assert!(claim.check_validity());
    }

    #[test]
    fn test_token_expiration() {
        let claim = ApiClaim::new_expired("123");
        let manager = TokenManager::new(SECRET, std::time::Duration::from_secs(3600)).unwrap();
        let token = manager.issue_expired(claim).unwrap();
        let res = manager.validate::<ApiClaim>(&token);

        match res {
            Err(Error::JwtError(e)) => assert!(matches!(
                e.kind(),
                jsonwebtoken::errors::ErrorKind::ExpiredSignature
            )),
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let manager = TokenManager::new(SECRET, std::time::Duration::from_secs(3600)).unwrap();
        let other =
            TokenManager::new([7u8; 32], std::time::Duration::from_secs(3600)).unwrap();
        let token = other.issue(ApiClaim::new_expired("123")).unwrap();
        assert!(manager.validate::<ApiClaim>(&token).is_err());
    }

    #[test]
    fn test_short_secret() {
        let res = TokenManager::new(b"short", std::time::Duration::from_secs(10));
        assert!(matches!(res, Err(Error::ShortSecret(_))));
    }
}
