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

use super::{init_live_test, load_static_credential, send_streaming_request};
use anyhow::Result;
use http::{Method, Request, StatusCode};
use log::warn;
use s3sign_aws_v4::ChecksumAlgorithm;
use s3sign_core::Body;

#[test]
fn test_put_object_streaming() -> Result<()> {
    let Some((ctx, signer, url)) = init_live_test() else {
        warn!("S3SIGN_AWS_V4_TEST is not set, skipped");
        return Ok(());
    };

    let cred = load_static_credential();
    let payload = vec![b'a'; 200 * 1024 + 17];

    let mut parts = Request::builder()
        .method(Method::PUT)
        .uri(format!("{url}/put_object_streaming_test"))
        .body(())?
        .into_parts()
        .0;
    let body = signer.sign_streaming(&ctx, &mut parts, &cred, Body::from_bytes(payload))?;

    let (status, _body) = send_streaming_request(parts, body)?;
    assert_eq!(StatusCode::OK, status);
    Ok(())
}

#[test]
fn test_put_object_streaming_with_trailer() -> Result<()> {
    let Some((ctx, signer, url)) = init_live_test() else {
        warn!("S3SIGN_AWS_V4_TEST is not set, skipped");
        return Ok(());
    };

    let cred = load_static_credential();
    let signer = signer.with_checksum_algorithm(ChecksumAlgorithm::Crc32c);
    let payload = vec![b'b'; 100 * 1024];

    let mut parts = Request::builder()
        .method(Method::PUT)
        .uri(format!("{url}/put_object_streaming_trailer_test"))
        .body(())?
        .into_parts()
        .0;
    let body = signer.sign_streaming(&ctx, &mut parts, &cred, Body::from_bytes(payload))?;

    let (status, _body) = send_streaming_request(parts, body)?;
    assert_eq!(StatusCode::OK, status);
    Ok(())
}

#[test]
fn test_put_empty_object_streaming() -> Result<()> {
    let Some((ctx, signer, url)) = init_live_test() else {
        warn!("S3SIGN_AWS_V4_TEST is not set, skipped");
        return Ok(());
    };

    let cred = load_static_credential();

    let mut parts = Request::builder()
        .method(Method::PUT)
        .uri(format!("{url}/put_empty_object_streaming_test"))
        .body(())?
        .into_parts()
        .0;
    let body = signer.sign_streaming(&ctx, &mut parts, &cred, Body::empty())?;

    let (status, _body) = send_streaming_request(parts, body)?;
    assert_eq!(StatusCode::OK, status);
    Ok(())
}
