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

//! `aws-chunked` body encoding with per-chunk signatures.
//!
//! Every chunk is framed as:
//!
//! ```text
//! <hex size>;chunk-signature=<signature>\r\n
//! <data>\r\n
//! ```
//!
//! and the body ends with a zero-length chunk, optionally followed by a
//! signed trailer carrying an `x-amz-checksum-*` header.

use std::cmp::min;
use std::io;
use std::io::Read;

use bytes::{Buf, BufMut, BytesMut};
use log::debug;
use s3sign_core::hash::{hex_sha256, EMPTY_STRING_SHA256};
use s3sign_core::Error;

use crate::checksum::{Checksum, ChecksumAlgorithm};
use crate::constants::{
    CHUNK_SIGNATURE_PREFIX, CRLF, SIGNATURE_LEN, X_AMZ_TRAILER_SIGNATURE,
};
use crate::signature::SignatureChain;

/// Number of bytes the encoded stream will contain.
///
/// Used as `Content-Length` of the request, so it has to match what
/// [`ChunkedEncoder`] emits byte for byte.
pub fn encoded_content_length(
    decoded_len: u64,
    chunk_size: usize,
    trailer: Option<ChecksumAlgorithm>,
) -> u64 {
    let chunk_size = chunk_size.max(1) as u64;
    let full_chunks = decoded_len / chunk_size;
    let rem = decoded_len % chunk_size;

    let mut len = full_chunks * frame_len(chunk_size);
    if rem > 0 {
        len += frame_len(rem);
    }

    match trailer {
        None => len + frame_len(0),
        Some(algo) => {
            let header_len = 1 + CHUNK_SIGNATURE_PREFIX.len() as u64 + SIGNATURE_LEN + 2;
            let trailer_len = algo.header_name().len() as u64 + 1 + algo.encoded_len() as u64 + 2;
            let signature_len = X_AMZ_TRAILER_SIGNATURE.len() as u64 + 1 + SIGNATURE_LEN + 2;
            len + header_len + trailer_len + signature_len + 2
        }
    }
}

fn frame_len(size: u64) -> u64 {
    hex_len(size) + CHUNK_SIGNATURE_PREFIX.len() as u64 + SIGNATURE_LEN + 2 + size + 2
}

fn hex_len(size: u64) -> u64 {
    if size == 0 {
        1
    } else {
        (64 - size.leading_zeros() as u64).div_ceil(4)
    }
}

enum State {
    Streaming,
    FinalChunkPending,
    TrailerPending,
    Done,
    Failed(io::ErrorKind, String),
}

/// Reader that turns a payload into a signed `aws-chunked` stream.
///
/// Chunks are read and signed lazily inside [`Read::read`], so at most one
/// chunk plus its framing is held in memory. The source must yield exactly
/// `decoded_len` bytes: a shorter source fails with
/// [`io::ErrorKind::UnexpectedEof`] and a longer one with
/// [`io::ErrorKind::InvalidData`], both wrapping an
/// [`ErrorKind::ContentLengthMismatch`](s3sign_core::ErrorKind::ContentLengthMismatch).
///
/// Once a read has failed, all later reads fail too. A broken stream never
/// produces a terminating chunk.
///
/// With a trailer, the stream ends in the form documented for S3 trailing
/// checksums, every line terminated by CRLF:
///
/// ```text
/// 0;chunk-signature=<signature>\r\n
/// x-amz-checksum-<algo>:<base64 value>\r\n
/// x-amz-trailer-signature:<signature>\r\n
/// \r\n
/// ```
///
/// The trailer signature is computed over `x-amz-checksum-<algo>:<value>\n`.
pub struct ChunkedEncoder<R> {
    source: R,
    chain: SignatureChain,
    chunk_size: usize,
    remaining: u64,
    trailer: Option<(ChecksumAlgorithm, Checksum)>,

    state: State,
    chunk: Vec<u8>,
    output: BytesMut,
}

impl<R: Read> ChunkedEncoder<R> {
    /// Create an encoder over `source`.
    ///
    /// `chain` must be seeded with the seed signature of the request this
    /// body belongs to.
    pub fn new(
        source: R,
        decoded_len: u64,
        chunk_size: usize,
        chain: SignatureChain,
        trailer: Option<ChecksumAlgorithm>,
    ) -> Self {
        // A zero chunk size would never make progress.
        let chunk_size = chunk_size.max(1);

        Self {
            source,
            chain,
            chunk_size,
            remaining: decoded_len,
            trailer: trailer.map(|algo| (algo, algo.checksum())),

            state: State::Streaming,
            chunk: Vec::with_capacity(min(chunk_size as u64, decoded_len) as usize),
            output: BytesMut::new(),
        }
    }

    /// Stage the next piece of the encoded stream into `output`.
    fn fill(&mut self) -> io::Result<()> {
        match self.state {
            State::Streaming if self.remaining == 0 => {
                self.ensure_source_drained()?;
                self.state = State::FinalChunkPending;
            }
            State::Streaming => {
                let size = min(self.chunk_size as u64, self.remaining) as usize;
                self.chunk.resize(size, 0);
                self.read_chunk()?;
                self.remaining -= size as u64;

                if let Some((_, checksum)) = self.trailer.as_mut() {
                    checksum.update(&self.chunk);
                }
                let signature = self.chain.next_chunk(&hex_sha256(&self.chunk));
                debug!(
                    "signed chunk of {size} bytes, {} bytes remaining",
                    self.remaining
                );

                self.output
                    .reserve(frame_len(size as u64) as usize);
                self.output.put_slice(format!("{size:x}").as_bytes());
                self.output.put_slice(CHUNK_SIGNATURE_PREFIX.as_bytes());
                self.output.put_slice(signature.as_bytes());
                self.output.put_slice(CRLF.as_bytes());
                self.output.put_slice(&self.chunk);
                self.output.put_slice(CRLF.as_bytes());
            }
            State::FinalChunkPending => {
                let signature = self.chain.next_chunk(EMPTY_STRING_SHA256);
                debug!("signed final chunk");

                self.output.put_slice(b"0");
                self.output.put_slice(CHUNK_SIGNATURE_PREFIX.as_bytes());
                self.output.put_slice(signature.as_bytes());
                self.output.put_slice(CRLF.as_bytes());

                if self.trailer.is_some() {
                    self.state = State::TrailerPending;
                } else {
                    self.output.put_slice(CRLF.as_bytes());
                    self.state = State::Done;
                }
            }
            // Written as `name:value\r\n`, signed as `name:value\n`.
            State::TrailerPending => {
                let (algo, checksum) = self
                    .trailer
                    .take()
                    .ok_or_else(|| Error::unexpected("trailer checksum has been consumed"))?;
                let trailer = format!("{}:{}", algo.header_name(), checksum.finalize());
                let signature = self
                    .chain
                    .next_trailer(&hex_sha256(format!("{trailer}\n").as_bytes()));
                debug!("signed trailer {trailer}");

                self.output.put_slice(trailer.as_bytes());
                self.output.put_slice(CRLF.as_bytes());
                self.output.put_slice(X_AMZ_TRAILER_SIGNATURE.as_bytes());
                self.output.put_slice(b":");
                self.output.put_slice(signature.as_bytes());
                self.output.put_slice(CRLF.as_bytes());
                self.output.put_slice(CRLF.as_bytes());
                self.state = State::Done;
            }
            State::Done | State::Failed(..) => {}
        }

        Ok(())
    }

    /// Fill `self.chunk` completely, looping over short reads.
    fn read_chunk(&mut self) -> io::Result<()> {
        let mut filled = 0;
        while filled < self.chunk.len() {
            match self.source.read(&mut self.chunk[filled..]) {
                Ok(0) => {
                    let err = Error::content_length_mismatch(format!(
                        "body ended {} bytes before its declared length",
                        self.remaining - filled as u64
                    ));
                    return Err(io::Error::new(io::ErrorKind::UnexpectedEof, err));
                }
                Ok(n) => filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Make sure the source has nothing left beyond the declared length.
    fn ensure_source_drained(&mut self) -> io::Result<()> {
        let mut probe = [0u8; 1];
        loop {
            match self.source.read(&mut probe) {
                Ok(0) => return Ok(()),
                Ok(_) => {
                    return Err(Error::content_length_mismatch(
                        "body is longer than its declared length",
                    )
                    .into())
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}

impl<R: Read> Read for ChunkedEncoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.output.is_empty() {
            match &self.state {
                State::Done => return Ok(0),
                State::Failed(kind, msg) => return Err(io::Error::new(*kind, msg.clone())),
                _ => {}
            }

            if let Err(err) = self.fill() {
                self.state = State::Failed(err.kind(), err.to_string());
                return Err(err);
            }
        }

        let n = min(buf.len(), self.output.len());
        buf[..n].copy_from_slice(&self.output[..n]);
        self.output.advance(n);
        Ok(n)
    }
}
