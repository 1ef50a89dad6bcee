//! RDS IAM 认证 token 生成
//!
//! token 即一个 SigV4 预签名的 `Action=connect` 请求（去掉 scheme），
//! 作为数据库密码使用，有效期 15 分钟

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use super::credentials::CredentialBundle;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "rds-db";
/// sha256("")
const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// token 有效期（秒）
pub const TOKEN_EXPIRES_IN_SECONDS: u64 = 900;

/// 生成 token 所需的参数
#[derive(Debug, Clone, Copy)]
pub struct TokenRequest<'a> {
    pub host: &'a str,
    pub port: i32,
    pub region: &'a str,
    pub user: &'a str,
    pub credentials: &'a CredentialBundle,
}

/// token 生成器抽象
pub trait TokenDeriver: Send + Sync {
    fn derive(&self, request: &TokenRequest<'_>) -> anyhow::Result<String>;
}

/// 标准 RDS IAM token 生成器
#[derive(Debug, Clone, Copy, Default)]
pub struct RdsTokenDeriver;

impl RdsTokenDeriver {
    /// 以指定时间签名
    pub fn derive_at(
        &self,
        request: &TokenRequest<'_>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<String> {
        let creds = request.credentials;
        if creds.is_anonymous() {
            anyhow::bail!("access key id and secret access key must not be empty");
        }

        let endpoint = format!("{}:{}", request.host, request.port);
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let scope = format!("{}/{}/{}/aws4_request", date, request.region, SERVICE);

        let mut params: Vec<(&str, String)> = vec![
            ("Action", "connect".to_string()),
            ("DBUser", request.user.to_string()),
            ("X-Amz-Algorithm", ALGORITHM.to_string()),
            ("X-Amz-Credential", format!("{}/{}", creds.access_key_id, scope)),
            ("X-Amz-Date", amz_date.clone()),
            ("X-Amz-Expires", TOKEN_EXPIRES_IN_SECONDS.to_string()),
            ("X-Amz-SignedHeaders", "host".to_string()),
        ];
        if let Some(session_token) = &creds.session_token {
            params.push(("X-Amz-Security-Token", session_token.clone()));
        }
        params.sort_by(|a, b| a.0.cmp(b.0));

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let canonical_request = format!(
            "GET\n/\n{}\nhost:{}\n\nhost\n{}",
            query, endpoint, EMPTY_PAYLOAD_SHA256
        );
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let key = signing_key(&creds.secret_access_key, &date, request.region, SERVICE)?;
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

        Ok(format!(
            "{}/?{}&X-Amz-Signature={}",
            endpoint, query, signature
        ))
    }
}

impl TokenDeriver for RdsTokenDeriver {
    fn derive(&self, request: &TokenRequest<'_>) -> anyhow::Result<String> {
        self.derive_at(request, Utc::now())
    }
}

fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> anyhow::Result<Vec<u8>> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| anyhow::anyhow!("HMAC key error: {}", e))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
