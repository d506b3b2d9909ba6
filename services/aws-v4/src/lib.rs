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

//! AWS SigV4 streaming upload signer
//!
//! This crate signs S3 uploads whose payload is sent as `aws-chunked`:
//! the request carries a seed signature, and every chunk of the body is
//! signed on the fly while the body is being read.
//!
//! - Chunk signatures chained from the seed signature
//! - Optional signed trailer with an `x-amz-checksum-*` value
//! - `Content-Length` computed before the payload is read
//!
//! # Example
//!
//! ```rust,no_run
//! use s3sign_aws_v4::{EnvCredentialProvider, StreamingRequestSigner};
//! use s3sign_core::{Body, Context, Result, Signer};
//!
//! # async fn example() -> Result<()> {
//! let ctx = Context::new();
//! let signer = Signer::new(
//!     ctx,
//!     EnvCredentialProvider::new(),
//!     StreamingRequestSigner::new("s3", "us-east-1"),
//! );
//!
//! let mut parts = http::Request::put("https://examplebucket.s3.amazonaws.com/hello.txt")
//!     .body(())?
//!     .into_parts()
//!     .0;
//! let body = signer
//!     .sign(&mut parts, Body::from_bytes("Hello, World!"))
//!     .await?;
//!
//! // Send `parts` with `body`; `body.content_length()` is the encoded length.
//! # Ok(())
//! # }
//! ```

mod canonical;
pub use canonical::{
    build_canonical_request, canonical_path, canonical_query_string, signed_header_names,
};

mod checksum;
pub use checksum::{Checksum, ChecksumAlgorithm};

mod chunked;
pub use chunked::{encoded_content_length, ChunkedEncoder};

mod config;
pub use config::Config;

mod constants;
pub use constants::{DEFAULT_CHUNK_SIZE, MIN_CHUNK_SIZE};

mod credential;
pub use credential::Credential;

mod provide_credential;
pub use provide_credential::*;

mod signature;
pub use signature::{
    chunk_signature, seed_signature, trailer_chunk_signature, SignatureChain, SigningKey,
};

mod sign_request;
pub use sign_request::StreamingRequestSigner;
