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

//! Canonical request construction for SigV4.
//!
//! - [Create a canonical request](https://docs.aws.amazon.com/IAM/latest/UserGuide/create-signed-request.html#create-canonical-request)

use std::fmt::Write;

use http::{HeaderMap, Method};
use percent_encoding::{percent_decode_str, utf8_percent_encode};
use s3sign_core::{Error, Result};

use crate::constants::{AWS_QUERY_ENCODE_SET, AWS_URI_ENCODE_SET};

/// Headers that never take part in the signature.
///
/// Both may be rewritten by proxies or HTTP clients after signing.
const IGNORED_HEADERS: &[&str] = &["authorization", "user-agent"];

/// Build the canonical request string:
///
/// ```text
/// <method>\n
/// <canonical path>\n
/// <canonical query>\n
/// <name>:<value>\n ... (one line per signed header)
/// \n
/// <signed headers>\n
/// <payload hash>
/// ```
///
/// `signed_headers` must be lower-case; they are sorted here. Values of a
/// repeated header are joined with `,`. Header values are treated as opaque
/// bytes, so a non utf-8 value never makes this fail.
pub fn build_canonical_request(
    method: &Method,
    path: &str,
    raw_query: Option<&str>,
    headers: &HeaderMap,
    signed_headers: &[String],
    payload_hash: &str,
) -> Result<String> {
    let mut names: Vec<&str> = signed_headers.iter().map(String::as_str).collect();
    names.sort_unstable();
    names.dedup();

    // 256 is specially chosen to avoid reallocation for most requests.
    let mut f = String::with_capacity(256);
    writeln!(f, "{method}")?;
    writeln!(f, "{}", canonical_path(path)?)?;
    writeln!(f, "{}", canonical_query_string(raw_query.unwrap_or_default())?)?;
    for name in names.iter() {
        let value = headers
            .get_all(*name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).trim().to_string())
            .collect::<Vec<_>>()
            .join(",");
        writeln!(f, "{name}:{value}")?;
    }
    writeln!(f)?;
    writeln!(f, "{}", names.join(";"))?;
    write!(f, "{payload_hash}")?;

    Ok(f)
}

/// Percent decode the path and encode it again with the AWS URI encode set.
///
/// An empty path is signed as `/`.
pub fn canonical_path(path: &str) -> Result<String> {
    if path.is_empty() {
        return Ok("/".to_string());
    }

    let decoded = percent_decode_str(path).decode_utf8().map_err(|e| {
        Error::request_invalid(format!("path {path:?} is malformed")).with_source(e)
    })?;
    Ok(utf8_percent_encode(&decoded, &AWS_URI_ENCODE_SET).to_string())
}

/// Normalize a raw query string.
///
/// Pairs are decoded as `application/x-www-form-urlencoded` (so `+` is a
/// space), encoded again with the strict AWS query set (space becomes `%20`,
/// `/` and `+` are encoded), then sorted by key and value. A key without `=`
/// is rendered as `key=`.
pub fn canonical_query_string(raw_query: &str) -> Result<String> {
    // form_urlencoded replaces invalid utf-8 silently.
    percent_decode_str(raw_query).decode_utf8().map_err(|e| {
        Error::request_invalid(format!("query {raw_query:?} is malformed")).with_source(e)
    })?;

    let mut pairs = form_urlencoded::parse(raw_query.as_bytes())
        .map(|(k, v)| {
            (
                utf8_percent_encode(&k, &AWS_QUERY_ENCODE_SET).to_string(),
                utf8_percent_encode(&v, &AWS_QUERY_ENCODE_SET).to_string(),
            )
        })
        .collect::<Vec<_>>();
    pairs.sort();

    Ok(pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&"))
}

/// Names of all headers in `headers` that should be signed, lower-cased and sorted.
pub fn signed_header_names(headers: &HeaderMap) -> Vec<String> {
    let mut names = headers
        .keys()
        .map(|k| k.as_str())
        .filter(|k| !IGNORED_HEADERS.contains(k))
        .map(|k| k.to_string())
        .collect::<Vec<_>>();
    names.sort_unstable();
    names
}
