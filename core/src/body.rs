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

use bytes::Buf;
use bytes::Bytes;
use std::fmt::{Debug, Formatter};
use std::io::Read;

/// Body is a request body that can be read exactly once, together with the
/// number of bytes it will produce.
///
/// Signers take the caller's body and hand back a (possibly re-encoded) body
/// whose `content_length` matches what will go on the wire.
pub struct Body {
    reader: Box<dyn Read + Send>,
    content_length: u64,
}

impl Body {
    /// Create a new body from a reader that yields exactly `content_length` bytes.
    pub fn new(reader: impl Read + Send + 'static, content_length: u64) -> Self {
        Self {
            reader: Box::new(reader),
            content_length,
        }
    }

    /// Create a body with no content.
    pub fn empty() -> Self {
        Self::from_bytes(Bytes::new())
    }

    /// Create a body from in-memory bytes.
    pub fn from_bytes(bs: impl Into<Bytes>) -> Self {
        let bs = bs.into();
        let content_length = bs.len() as u64;
        Self::new(bs.reader(), content_length)
    }

    /// The number of bytes this body yields.
    pub fn content_length(&self) -> u64 {
        self.content_length
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

impl Debug for Body {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Body")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}
