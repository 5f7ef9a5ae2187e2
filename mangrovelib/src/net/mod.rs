// Copyright (C) 2024-2026 Mangrove Labs
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

pub mod chain_exchange;
pub mod codec;

use std::{error, fmt};

use mangrove_common::codec::Error as codec_error;
use mangrove_common::types::BlockId;

use crate::chain::{BlockHeader, SignedMessage, UnsignedMessage};

/// Stream protocol identifier the transport uses to select a compatible
/// peer. Bump the version on any incompatible wire change.
pub const CHAIN_EXCHANGE_PROTOCOL_ID: &str = "/mangrove/chainxchg/0.0.1";

/// Longest ancestor walk a single request may ask for, head inclusive.
/// Callers that need a longer segment must issue multiple requests and
/// stitch the results.
pub const MAX_REQUEST_LENGTH: u64 = 900;

/// Most messages either pool of a compacted tipset may carry.
pub const MAX_POOL_MESSAGES: u32 = 8192;

/// Most bytes a peer-supplied diagnostic string may carry.
pub const MAX_ERROR_MESSAGE_LEN: u32 = 1024;

// Transport policy defaults. Enforcement lives in the transport; they are
// grouped here so both sides agree on what "too slow" means.
pub const WRITE_REQUEST_DEADLINE_SECS: u64 = 5;
pub const READ_RESPONSE_DEADLINE_SECS: u64 = 5;
pub const WRITE_RESPONSE_DEADLINE_SECS: u64 = 60;
pub const READ_RESPONSE_MIN_RATE: u64 = 50 * 1024;

#[derive(Debug)]
pub enum Error {
    /// Failed to encode or decode a wire structure
    Codec(codec_error),
    /// Request failed validation; a caller bug, never retried
    InvalidRequest(String),
    /// Peer does not have the requested tipsets; safe to retry elsewhere
    NotFound,
    /// Peer asked us to stop querying it
    GoAway,
    /// Peer reported an internal failure serving the request
    RemoteInternalError(String),
    /// Peer rejected our request as malformed
    RemoteBadRequest(String),
    /// Peer sent a status code outside the protocol
    UnrecognizedStatus(u64),
    /// Peer's payload contradicts its own status code
    ProtocolViolation(String),
    /// Compacted messages do not resolve against their block list
    DecodeFailure(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Codec(ref e) => fmt::Display::fmt(e, f),
            Error::InvalidRequest(ref s) => write!(f, "Invalid chain-exchange request: {s}"),
            Error::NotFound => write!(f, "Peer does not have the requested chain segment"),
            Error::GoAway => write!(f, "Peer asked us to stop querying it"),
            Error::RemoteInternalError(ref s) => write!(f, "Peer errored serving the request: {s}"),
            Error::RemoteBadRequest(ref s) => write!(f, "Peer rejected the request: {s}"),
            Error::UnrecognizedStatus(code) => {
                write!(f, "Unrecognized response status code: {code}")
            }
            Error::ProtocolViolation(ref s) => write!(f, "Protocol violation: {s}"),
            Error::DecodeFailure(ref s) => write!(f, "Failed to decode compacted messages: {s}"),
        }
    }
}

impl error::Error for Error {
    fn cause(&self) -> Option<&dyn error::Error> {
        match *self {
            Error::Codec(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<codec_error> for Error {
    fn from(e: codec_error) -> Error {
        Error::Codec(e)
    }
}

impl Error {
    /// Whether the same request may be retried against a *different*
    /// peer. Everything except a plain miss is terminal for this
    /// request/peer pair.
    pub fn is_retryable(&self) -> bool {
        matches!(*self, Error::NotFound)
    }
}

// Response status codes on the wire.
pub const STATUS_OK: u64 = 0;
pub const STATUS_PARTIAL: u64 = 101;
pub const STATUS_NOT_FOUND: u64 = 201;
pub const STATUS_GO_AWAY: u64 = 202;
pub const STATUS_INTERNAL_ERROR: u64 = 203;
pub const STATUS_BAD_REQUEST: u64 = 204;

/// A response status code, decoded into a closed set. Codes outside the
/// protocol land in `Unrecognized` so no call site can mistake them for
/// success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeStatus {
    /// Peer returned the full segment requested
    Ok,
    /// Peer returned a head-anchored prefix of the segment. Usable, not
    /// an error.
    Partial,
    NotFound,
    GoAway,
    InternalError,
    BadRequest,
    Unrecognized(u64),
}

impl ExchangeStatus {
    pub fn from_code(code: u64) -> ExchangeStatus {
        match code {
            STATUS_OK => ExchangeStatus::Ok,
            STATUS_PARTIAL => ExchangeStatus::Partial,
            STATUS_NOT_FOUND => ExchangeStatus::NotFound,
            STATUS_GO_AWAY => ExchangeStatus::GoAway,
            STATUS_INTERNAL_ERROR => ExchangeStatus::InternalError,
            STATUS_BAD_REQUEST => ExchangeStatus::BadRequest,
            other => ExchangeStatus::Unrecognized(other),
        }
    }

    pub fn code(&self) -> u64 {
        match *self {
            ExchangeStatus::Ok => STATUS_OK,
            ExchangeStatus::Partial => STATUS_PARTIAL,
            ExchangeStatus::NotFound => STATUS_NOT_FOUND,
            ExchangeStatus::GoAway => STATUS_GO_AWAY,
            ExchangeStatus::InternalError => STATUS_INTERNAL_ERROR,
            ExchangeStatus::BadRequest => STATUS_BAD_REQUEST,
            ExchangeStatus::Unrecognized(code) => code,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(*self, ExchangeStatus::Ok | ExchangeStatus::Partial)
    }
}

impl fmt::Display for ExchangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ExchangeStatus::Ok => write!(f, "Ok"),
            ExchangeStatus::Partial => write!(f, "Partial"),
            ExchangeStatus::NotFound => write!(f, "NotFound"),
            ExchangeStatus::GoAway => write!(f, "GoAway"),
            ExchangeStatus::InternalError => write!(f, "InternalError"),
            ExchangeStatus::BadRequest => write!(f, "BadRequest"),
            ExchangeStatus::Unrecognized(code) => write!(f, "Unrecognized({code})"),
        }
    }
}

// Bit layout of `GetChainData.options`. Higher bits are reserved;
// decoders ignore bits they do not recognize.
pub const GET_HEADERS: u64 = 1 << 0;
pub const GET_MESSAGES: u64 = 1 << 1;

/// The request's content kinds, unpacked into named booleans so callers
/// never poke at raw bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetChainDataFlags {
    pub include_headers: bool,
    pub include_messages: bool,
}

impl GetChainDataFlags {
    pub fn new(include_headers: bool, include_messages: bool) -> GetChainDataFlags {
        GetChainDataFlags {
            include_headers,
            include_messages,
        }
    }

    /// Compress into the single wire integer.
    pub fn pack(&self) -> u64 {
        let mut bits = 0u64;
        if self.include_headers {
            bits |= GET_HEADERS;
        }
        if self.include_messages {
            bits |= GET_MESSAGES;
        }
        bits
    }

    /// Expand from the wire integer. Unknown bits are ignored, so a
    /// newer peer's extra flags do not break us.
    pub fn unpack(bits: u64) -> GetChainDataFlags {
        GetChainDataFlags {
            include_headers: bits & GET_HEADERS != 0,
            include_messages: bits & GET_MESSAGES != 0,
        }
    }

    pub fn none_set(&self) -> bool {
        !self.include_headers && !self.include_messages
    }
}

/// Request for a chain segment: walk backward from the tipset identified
/// by `head`, for `length` tipsets (head inclusive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetChainData {
    /// block ids naming the tipset to start from
    pub head: Vec<BlockId>,
    /// number of tipsets to fetch, in `[1, MAX_REQUEST_LENGTH]`
    pub length: u64,
    /// requested content kinds, see `GetChainDataFlags`
    pub options: u64,
}

impl GetChainData {
    pub fn new(head: Vec<BlockId>, length: u64, flags: GetChainDataFlags) -> GetChainData {
        GetChainData {
            head,
            length,
            options: flags.pack(),
        }
    }

    pub fn flags(&self) -> GetChainDataFlags {
        GetChainDataFlags::unpack(self.options)
    }
}

/// Response to a `GetChainData`. `chain` runs from the requested head
/// backward through its ancestors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainData {
    /// one of the STATUS_* codes
    pub status: u64,
    /// diagnostic text for the error-class statuses
    pub error_message: String,
    pub chain: Vec<TipsetBundle>,
}

impl ChainData {
    /// Build an error-class response with a diagnostic for the caller.
    pub fn error(status: ExchangeStatus, error_message: &str) -> ChainData {
        ChainData {
            status: status.code(),
            error_message: error_message.to_string(),
            chain: vec![],
        }
    }

    pub fn status(&self) -> ExchangeStatus {
        ExchangeStatus::from_code(self.status)
    }
}

/// One tipset of a response: its block headers, plus its messages in
/// compacted form when the request asked for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipsetBundle {
    pub headers: Vec<BlockHeader>,
    pub messages: Option<CompactedMessages>,
}

/// Deduplicated encoding of a tipset's messages: one pool per
/// authentication scheme, plus per-block lists of pool indices. A
/// message referenced by several blocks is shipped once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactedMessages {
    pub bls_msgs: Vec<UnsignedMessage>,
    /// for each block, indices into `bls_msgs`, in the block's order
    pub bls_includes: Vec<Vec<u64>>,
    pub secp_msgs: Vec<SignedMessage>,
    /// for each block, indices into `secp_msgs`, in the block's order
    pub secp_includes: Vec<Vec<u64>>,
}

/// Limits and deadlines for chain-exchange calls, supplied by node
/// configuration. The codec and validator consult `max_request_len`;
/// the deadline and throughput fields are enforced by the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub max_request_len: u64,
    pub write_request_deadline_secs: u64,
    pub read_response_deadline_secs: u64,
    pub write_response_deadline_secs: u64,
    /// bytes per second below which a peer is considered stalled
    pub read_response_min_rate: u64,
}

impl Default for ExchangeConfig {
    fn default() -> ExchangeConfig {
        ExchangeConfig {
            max_request_len: MAX_REQUEST_LENGTH,
            write_request_deadline_secs: WRITE_REQUEST_DEADLINE_SECS,
            read_response_deadline_secs: READ_RESPONSE_DEADLINE_SECS,
            write_response_deadline_secs: WRITE_RESPONSE_DEADLINE_SECS,
            read_response_min_rate: READ_RESPONSE_MIN_RATE,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_codes_round_trip() {
        for code in [0u64, 101, 201, 202, 203, 204] {
            let status = ExchangeStatus::from_code(code);
            assert!(!matches!(status, ExchangeStatus::Unrecognized(_)));
            assert_eq!(status.code(), code);
        }
        assert_eq!(
            ExchangeStatus::from_code(999),
            ExchangeStatus::Unrecognized(999)
        );
        assert_eq!(ExchangeStatus::Unrecognized(999).code(), 999);
    }

    #[test]
    fn status_success_classes() {
        assert!(ExchangeStatus::Ok.is_success());
        assert!(ExchangeStatus::Partial.is_success());
        assert!(!ExchangeStatus::NotFound.is_success());
        assert!(!ExchangeStatus::GoAway.is_success());
        assert!(!ExchangeStatus::InternalError.is_success());
        assert!(!ExchangeStatus::BadRequest.is_success());
        assert!(!ExchangeStatus::Unrecognized(1).is_success());
    }

    #[test]
    fn flags_pack_unpack() {
        let both = GetChainDataFlags::new(true, true);
        assert_eq!(both.pack(), 0b11);
        assert_eq!(GetChainDataFlags::unpack(0b11), both);

        let headers = GetChainDataFlags::new(true, false);
        assert_eq!(headers.pack(), 0b01);
        assert_eq!(GetChainDataFlags::unpack(0b01), headers);

        let messages = GetChainDataFlags::new(false, true);
        assert_eq!(messages.pack(), 0b10);
        assert_eq!(GetChainDataFlags::unpack(0b10), messages);

        assert!(GetChainDataFlags::unpack(0).none_set());
    }

    #[test]
    fn flags_ignore_reserved_bits() {
        // a newer peer setting reserved bits must decode like a current one
        let bits = 0b11 | (1 << 7) | (1 << 63);
        assert_eq!(
            GetChainDataFlags::unpack(bits),
            GetChainDataFlags::new(true, true)
        );

        // reserved bits alone request nothing we understand
        assert!(GetChainDataFlags::unpack(1 << 5).none_set());
    }

    #[test]
    fn retryability_is_notfound_only() {
        assert!(Error::NotFound.is_retryable());
        assert!(!Error::GoAway.is_retryable());
        assert!(!Error::UnrecognizedStatus(999).is_retryable());
        assert!(!Error::ProtocolViolation("x".to_string()).is_retryable());
        assert!(!Error::DecodeFailure("x".to_string()).is_retryable());
        assert!(!Error::RemoteBadRequest("x".to_string()).is_retryable());
    }

    #[test]
    fn default_config_uses_protocol_bounds() {
        let config = ExchangeConfig::default();
        assert_eq!(config.max_request_len, MAX_REQUEST_LENGTH);
        assert!(config.write_request_deadline_secs > 0);
        assert!(config.read_response_min_rate > 0);
    }
}
