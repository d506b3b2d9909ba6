// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Signature calculation for SigV4 and its streaming extension.
//!
//! A streaming upload is authenticated by a chain of signatures: the seed
//! signature covers the canonical request, every chunk signature covers the
//! chunk's SHA-256 and the signature before it, and an optional trailer
//! signature closes the chain.
//!
//! - [Signature calculations for the Authorization header](https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-streaming.html)

use log::debug;
use s3sign_core::hash::{hex_hmac_sha256, hex_sha256, hmac_sha256, EMPTY_STRING_SHA256};
use s3sign_core::time::{format_date, format_iso8601, DateTime};
use s3sign_core::{Error, Result};

use crate::constants::{
    AWS4_HMAC_SHA256, AWS4_HMAC_SHA256_PAYLOAD, AWS4_HMAC_SHA256_TRAILER, S3_SERVICE,
};

/// Signing key derived from a secret access key for one date, region and service.
#[derive(Clone)]
pub struct SigningKey {
    key: Vec<u8>,
    scope: String,
    timestamp: String,
}

impl SigningKey {
    /// Derive the signing key:
    ///
    /// ```text
    /// HMAC(HMAC(HMAC(HMAC("AWS4" + secret, date), region), service), "aws4_request")
    /// ```
    pub fn derive(secret: &str, time: DateTime, region: &str, service: &str) -> Result<Self> {
        if secret.is_empty() {
            return Err(Error::credential_invalid("secret access key is empty"));
        }

        let date = format_date(time);
        let secret = format!("AWS4{secret}");
        let sign_date = hmac_sha256(secret.as_bytes(), date.as_bytes());
        let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes());
        let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes());
        let key = hmac_sha256(sign_service.as_slice(), "aws4_request".as_bytes());

        Ok(Self {
            key,
            // Scope: "20220313/<region>/<service>/aws4_request"
            scope: format!("{date}/{region}/{service}/aws4_request"),
            timestamp: format_iso8601(time),
        })
    }

    /// Credential scope: `<date>/<region>/<service>/aws4_request`.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Signing time in `YYYYMMDD'T'HHMMSS'Z'` format.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Sign the canonical request, producing the seed signature.
    ///
    /// ```text
    /// AWS4-HMAC-SHA256
    /// 20130524T000000Z
    /// 20130524/us-east-1/s3/aws4_request
    /// <hex sha256 of canonical request>
    /// ```
    pub fn sign_canonical_request(&self, canonical_request: &str) -> String {
        let string_to_sign = format!(
            "{AWS4_HMAC_SHA256}\n{}\n{}\n{}",
            self.timestamp,
            self.scope,
            hex_sha256(canonical_request.as_bytes())
        );
        debug!("calculated string to sign: {string_to_sign}");

        hex_hmac_sha256(&self.key, string_to_sign.as_bytes())
    }

    /// Sign one chunk given the hex SHA-256 of its payload.
    ///
    /// ```text
    /// AWS4-HMAC-SHA256-PAYLOAD
    /// <timestamp>
    /// <scope>
    /// <previous signature>
    /// <hex sha256 of "">
    /// <hex sha256 of chunk>
    /// ```
    pub fn sign_chunk(&self, previous_signature: &str, chunk_checksum: &str) -> String {
        self.sign_chained(AWS4_HMAC_SHA256_PAYLOAD, previous_signature, chunk_checksum)
    }

    /// Sign the trailer chunk given the hex SHA-256 of its serialized headers.
    pub fn sign_trailer(&self, previous_signature: &str, trailer_checksum: &str) -> String {
        self.sign_chained(AWS4_HMAC_SHA256_TRAILER, previous_signature, trailer_checksum)
    }

    fn sign_chained(&self, algorithm: &str, previous_signature: &str, checksum: &str) -> String {
        let string_to_sign = format!(
            "{algorithm}\n{}\n{}\n{previous_signature}\n{EMPTY_STRING_SHA256}\n{checksum}",
            self.timestamp, self.scope
        );

        hex_hmac_sha256(&self.key, string_to_sign.as_bytes())
    }
}

/// Compute the seed signature of a canonical request.
pub fn seed_signature(
    canonical_request: &str,
    secret_access_key: &str,
    time: DateTime,
    region: &str,
    service: &str,
) -> Result<String> {
    let key = SigningKey::derive(secret_access_key, time, region, service)?;
    Ok(key.sign_canonical_request(canonical_request))
}

/// Compute the signature of one S3 data chunk.
///
/// The caller threads `previous_signature`: the seed signature for the first
/// chunk, then the result of the previous call.
pub fn chunk_signature(
    chunk_checksum: &str,
    time: DateTime,
    region: &str,
    previous_signature: &str,
    secret_access_key: &str,
) -> Result<String> {
    let key = SigningKey::derive(secret_access_key, time, region, S3_SERVICE)?;
    Ok(key.sign_chunk(previous_signature, chunk_checksum))
}

/// Compute the signature of the S3 trailer chunk.
///
/// `previous_signature` is the signature of the zero-length terminator chunk.
pub fn trailer_chunk_signature(
    trailer_checksum: &str,
    time: DateTime,
    region: &str,
    previous_signature: &str,
    secret_access_key: &str,
) -> Result<String> {
    let key = SigningKey::derive(secret_access_key, time, region, S3_SERVICE)?;
    Ok(key.sign_trailer(previous_signature, trailer_checksum))
}

/// Chain state of a streaming upload.
///
/// Holds the previous signature and moves it forward on every chunk. A chain
/// belongs to exactly one body; retries must start a new one.
pub struct SignatureChain {
    key: SigningKey,
    previous: String,
}

impl SignatureChain {
    /// Start a chain from the seed signature.
    pub fn new(key: SigningKey, seed_signature: String) -> Self {
        Self {
            key,
            previous: seed_signature,
        }
    }

    /// Signature of the most recently signed chunk, or the seed.
    pub fn previous_signature(&self) -> &str {
        &self.previous
    }

    /// Sign the next data (or terminator) chunk.
    pub fn next_chunk(&mut self, chunk_checksum: &str) -> &str {
        self.previous = self.key.sign_chunk(&self.previous, chunk_checksum);
        &self.previous
    }

    /// Sign the trailer chunk.
    pub fn next_trailer(&mut self, trailer_checksum: &str) -> &str {
        self.previous = self.key.sign_trailer(&self.previous, trailer_checksum);
        &self.previous
    }
}
