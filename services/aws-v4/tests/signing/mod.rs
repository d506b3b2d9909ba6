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

mod live;
mod offline;

use anyhow::{anyhow, Result};
use hmac::{Hmac, Mac};
use http::request::Parts;
use log::debug;
use s3sign_aws_v4::{Credential, StreamingRequestSigner};
use s3sign_core::{Body, Context};
use sha2::{Digest, Sha256};
use std::env;

/// Pieces of a decoded aws-chunked body.
#[derive(Debug, Default)]
pub struct DecodedBody {
    pub chunks: Vec<(Vec<u8>, String)>,
    pub final_signature: String,
    pub trailer: Option<(String, String)>,
}

impl DecodedBody {
    pub fn payload(&self) -> Vec<u8> {
        self.chunks
            .iter()
            .flat_map(|(data, _)| data.iter().copied())
            .collect()
    }
}

fn next_line<'a>(encoded: &'a [u8], pos: &mut usize) -> Result<&'a str> {
    let rest = &encoded[*pos..];
    let end = rest
        .windows(2)
        .position(|w| w == b"\r\n")
        .ok_or_else(|| anyhow!("line at {pos} is not terminated"))?;
    *pos += end + 2;
    Ok(std::str::from_utf8(&rest[..end])?)
}

/// Decode an aws-chunked body the way a server would.
pub fn decode_chunked(encoded: &[u8]) -> Result<DecodedBody> {
    let mut decoded = DecodedBody::default();
    let mut pos = 0;

    loop {
        let line = next_line(encoded, &mut pos)?;
        let (size, signature) = line
            .split_once(";chunk-signature=")
            .ok_or_else(|| anyhow!("chunk header {line:?} is malformed"))?;
        let size = usize::from_str_radix(size, 16)?;

        if size == 0 {
            decoded.final_signature = signature.to_string();
            break;
        }
        decoded
            .chunks
            .push((encoded[pos..pos + size].to_vec(), signature.to_string()));
        pos += size;
        if &encoded[pos..pos + 2] != b"\r\n" {
            return Err(anyhow!("chunk data at {pos} is not terminated"));
        }
        pos += 2;
    }

    if &encoded[pos..] != b"\r\n" {
        let trailer = next_line(encoded, &mut pos)?.to_string();
        let signature = next_line(encoded, &mut pos)?
            .strip_prefix("x-amz-trailer-signature:")
            .ok_or_else(|| anyhow!("trailer is not signed"))?
            .to_string();
        decoded.trailer = Some((trailer, signature));
    }
    if &encoded[pos..] != b"\r\n" {
        return Err(anyhow!("body has {} unexpected bytes", encoded.len() - pos));
    }

    Ok(decoded)
}

fn hmac_sha256(key: &[u8], content: &[u8]) -> Vec<u8> {
    let mut h = Hmac::<Sha256>::new_from_slice(key).expect("any key length is valid");
    h.update(content);
    h.finalize().into_bytes().to_vec()
}

fn hex_sha256(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// Verify every signature of a decoded body, starting from the seed.
pub fn verify_chain(
    decoded: &DecodedBody,
    secret: &str,
    date: &str,
    timestamp: &str,
    region: &str,
    seed: &str,
) {
    let key = [date, region, "s3", "aws4_request"]
        .iter()
        .fold(format!("AWS4{secret}").into_bytes(), |key, v| {
            hmac_sha256(&key, v.as_bytes())
        });
    let scope = format!("{date}/{region}/s3/aws4_request");
    let empty = hex_sha256(b"");
    let sign = |algorithm: &str, previous: &str, checksum: &str| {
        let string_to_sign =
            format!("{algorithm}\n{timestamp}\n{scope}\n{previous}\n{empty}\n{checksum}");
        hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()))
    };

    let mut previous = seed.to_string();
    for (data, signature) in decoded.chunks.iter() {
        previous = sign("AWS4-HMAC-SHA256-PAYLOAD", &previous, &hex_sha256(data));
        assert_eq!(&previous, signature);
    }
    previous = sign("AWS4-HMAC-SHA256-PAYLOAD", &previous, &empty);
    assert_eq!(previous, decoded.final_signature);

    if let Some((trailer, signature)) = decoded.trailer.as_ref() {
        let checksum = hex_sha256(format!("{trailer}\n").as_bytes());
        previous = sign("AWS4-HMAC-SHA256-TRAILER", &previous, &checksum);
        assert_eq!(&previous, signature);
    }
}

/// Extract the seed signature from a signed request.
pub fn seed_signature(parts: &Parts) -> String {
    let auth = parts.headers[http::header::AUTHORIZATION]
        .to_str()
        .expect("authorization must be valid");
    auth.rsplit_once("Signature=")
        .expect("authorization must carry a signature")
        .1
        .to_string()
}

/// Load static credential from environment variables
pub fn load_static_credential() -> Credential {
    let access_key =
        env::var("S3SIGN_AWS_V4_ACCESS_KEY").expect("S3SIGN_AWS_V4_ACCESS_KEY must be set");
    let secret_key =
        env::var("S3SIGN_AWS_V4_SECRET_KEY").expect("S3SIGN_AWS_V4_SECRET_KEY must be set");
    let session_token = env::var("S3SIGN_AWS_V4_SESSION_TOKEN").ok();

    Credential {
        access_key_id: access_key,
        secret_access_key: secret_key,
        session_token,
        expires_in: None,
    }
}

/// Initialize the live test environment, `None` if it's not enabled.
pub fn init_live_test() -> Option<(Context, StreamingRequestSigner, String)> {
    let _ = env_logger::builder().is_test(true).try_init();
    let _ = dotenv::dotenv();

    if env::var("S3SIGN_AWS_V4_TEST").ok().as_deref() != Some("on") {
        return None;
    }

    let region = env::var("S3SIGN_AWS_V4_REGION").expect("S3SIGN_AWS_V4_REGION must be set");
    let url = env::var("S3SIGN_AWS_V4_URL").expect("S3SIGN_AWS_V4_URL must be set");

    let signer = StreamingRequestSigner::new("s3", &region);
    Some((Context::new(), signer, url))
}

/// Send a signed streaming request with a blocking client.
pub fn send_streaming_request(parts: Parts, body: Body) -> Result<(http::StatusCode, String)> {
    let client = reqwest::blocking::Client::new();

    let content_length = body.content_length();
    let resp = client
        .request(parts.method, parts.uri.to_string())
        .headers(parts.headers)
        .body(reqwest::blocking::Body::sized(body, content_length))
        .send()?;

    let status = resp.status();
    let text = resp.text()?;
    debug!("response status: {status}, body: {text}");
    Ok((status, text))
}
