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

//! The chain-exchange protocol: fetch a segment of the chain (headers,
//! messages, or both) from a peer, walking backward from a given tipset.
//!
//! The serving side validates raw requests with `validate_request` and
//! assembles responses with `build_response`. The requesting side checks
//! a peer's reply against what it asked for with `validate_response` and
//! materializes full tipsets from the compacted message encoding. All
//! peer-supplied data is treated as hostile: every list index is bounds
//! checked and every structural claim is verified before use.

use hashbrown::HashMap;
use mangrove_common::types::MessageId;

use crate::chain::{FullBlock, FullTipset, SignedMessage, Tipset, TipsetKey, UnsignedMessage};
use crate::net::{
    ChainData, CompactedMessages, Error, ExchangeConfig, ExchangeStatus, GetChainData,
    GetChainDataFlags, TipsetBundle, STATUS_OK, STATUS_PARTIAL,
};

/// A request that passed server-side validation. The only form the
/// serving path acts on; constructed exclusively by `validate_request`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    head: TipsetKey,
    length: u64,
    flags: GetChainDataFlags,
}

impl ValidatedRequest {
    pub fn head(&self) -> &TipsetKey {
        &self.head
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn flags(&self) -> GetChainDataFlags {
        self.flags
    }

    pub fn include_headers(&self) -> bool {
        self.flags.include_headers
    }

    pub fn include_messages(&self) -> bool {
        self.flags.include_messages
    }
}

/// Server-side check of a raw request. Rejects an empty head, a walk
/// length outside `[1, max_request_len]`, and options that request
/// nothing we recognize.
pub fn validate_request(
    req: &GetChainData,
    config: &ExchangeConfig,
) -> Result<ValidatedRequest, Error> {
    if req.head.is_empty() {
        debug!("Rejected chain-exchange request with an empty head");
        return Err(Error::InvalidRequest("request head is empty".to_string()));
    }
    if req.length == 0 || req.length > config.max_request_len {
        debug!(
            "Rejected chain-exchange request; length {} out of bounds (max {})",
            req.length, config.max_request_len
        );
        return Err(Error::InvalidRequest(format!(
            "request length {} not in [1, {}]",
            req.length, config.max_request_len
        )));
    }
    let flags = req.flags();
    if flags.none_set() {
        debug!(
            "Rejected chain-exchange request asking for no content; options {:#x}",
            req.options
        );
        return Err(Error::InvalidRequest(
            "request asks for neither headers nor messages".to_string(),
        ));
    }
    Ok(ValidatedRequest {
        head: TipsetKey::new(req.head.clone()),
        length: req.length,
        flags,
    })
}

/// Build one scheme's pool and include lists. Each distinct message is
/// inserted once; blocks referencing it again get the existing index.
fn compact_scheme<'a, T, I, F>(per_block: I, id_of: F) -> (Vec<T>, Vec<Vec<u64>>)
where
    T: Clone + 'a,
    I: Iterator<Item = &'a [T]>,
    F: Fn(&T) -> MessageId,
{
    let mut pool: Vec<T> = vec![];
    let mut seen: HashMap<MessageId, u64> = HashMap::new();
    let mut includes: Vec<Vec<u64>> = vec![];
    for msgs in per_block {
        let mut row = Vec::with_capacity(msgs.len());
        for msg in msgs {
            let mid = id_of(msg);
            let idx = match seen.get(&mid) {
                Some(idx) => *idx,
                None => {
                    let idx = pool.len() as u64;
                    pool.push(msg.clone());
                    seen.insert(mid, idx);
                    idx
                }
            };
            row.push(idx);
        }
        includes.push(row);
    }
    (pool, includes)
}

/// Resolve one block's include list against a pool. An index past the
/// pool's end is a decode failure, never a panic.
fn resolve_includes<T: Clone>(pool: &[T], includes: &[u64]) -> Result<Vec<T>, Error> {
    let mut out = Vec::with_capacity(includes.len());
    for &idx in includes {
        let item = pool.get(idx as usize).ok_or_else(|| {
            Error::DecodeFailure(format!(
                "message index {} out of range for a pool of {}",
                idx,
                pool.len()
            ))
        })?;
        out.push(item.clone());
    }
    Ok(out)
}

impl CompactedMessages {
    /// Compress a tipset's per-block message lists into shared pools
    /// plus index lists, deduplicating by content id.
    pub fn compact(blocks: &[FullBlock]) -> CompactedMessages {
        let (bls_msgs, bls_includes) = compact_scheme(
            blocks.iter().map(|blk| &blk.bls_messages[..]),
            |msg: &UnsignedMessage| msg.message_id(),
        );
        let (secp_msgs, secp_includes) = compact_scheme(
            blocks.iter().map(|blk| &blk.secp_messages[..]),
            |msg: &SignedMessage| msg.message_id(),
        );
        CompactedMessages {
            bls_msgs,
            bls_includes,
            secp_msgs,
            secp_includes,
        }
    }

    /// Materialize per-block message lists for the given tipset. Fails
    /// if the include lists do not line up with the tipset's blocks or
    /// reference past a pool's end.
    pub fn unpack(&self, tipset: &Tipset) -> Result<FullTipset, Error> {
        let num_blocks = tipset.blocks().len();
        if self.bls_includes.len() != num_blocks || self.secp_includes.len() != num_blocks {
            return Err(Error::DecodeFailure(format!(
                "include lists cover {}/{} blocks, expected {}",
                self.bls_includes.len(),
                self.secp_includes.len(),
                num_blocks
            )));
        }
        let mut blocks = Vec::with_capacity(num_blocks);
        for (i, header) in tipset.blocks().iter().enumerate() {
            let bls_messages = resolve_includes(&self.bls_msgs, &self.bls_includes[i])?;
            let secp_messages = resolve_includes(&self.secp_msgs, &self.secp_includes[i])?;
            blocks.push(FullBlock {
                header: header.clone(),
                bls_messages,
                secp_messages,
            });
        }
        FullTipset::new(blocks)
            .map_err(|e| Error::ProtocolViolation(format!("reassembled tipset is invalid: {e}")))
    }
}

impl TipsetBundle {
    /// Encode one tipset of a response, including only what the request
    /// asked for.
    pub fn from_full_tipset(fts: &FullTipset, flags: GetChainDataFlags) -> TipsetBundle {
        TipsetBundle {
            headers: if flags.include_headers {
                fts.blocks().iter().map(|blk| blk.header.clone()).collect()
            } else {
                vec![]
            },
            messages: if flags.include_messages {
                Some(CompactedMessages::compact(fts.blocks()))
            } else {
                None
            },
        }
    }
}

/// Assemble a response for a validated request from the tipsets the
/// serving node actually found. An empty find is `NotFound`; a prefix
/// shorter than asked is `Partial`; the full segment is `Ok`.
pub fn build_response(req: &ValidatedRequest, chain: &[FullTipset]) -> ChainData {
    if chain.is_empty() {
        return ChainData::error(ExchangeStatus::NotFound, "no tipsets known for this head");
    }
    let flags = req.flags();
    let bundles = chain
        .iter()
        .map(|fts| TipsetBundle::from_full_tipset(fts, flags))
        .collect();
    let status = if (chain.len() as u64) < req.length() {
        STATUS_PARTIAL
    } else {
        STATUS_OK
    };
    ChainData {
        status,
        error_message: String::new(),
        chain: bundles,
    }
}

/// A response whose status and structure have been checked against the
/// request that produced it. Reading anything out of a peer's reply
/// goes through this type.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedChain {
    tipsets: Vec<Tipset>,
    messages: Vec<CompactedMessages>,
    partial: bool,
}

impl ValidatedChain {
    /// Headers of each fetched tipset, nearest the head first. Empty if
    /// the request did not ask for headers.
    pub fn tipsets(&self) -> &[Tipset] {
        &self.tipsets
    }

    /// Compacted message payloads per tipset, in walk order. Empty if
    /// the request did not ask for messages.
    pub fn compacted_messages(&self) -> &[CompactedMessages] {
        &self.messages
    }

    /// True when the peer returned a usable prefix instead of the whole
    /// segment. Callers wanting the rest must issue a follow-up request.
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    /// Number of tipsets fetched.
    pub fn len(&self) -> usize {
        if self.tipsets.is_empty() {
            self.messages.len()
        } else {
            self.tipsets.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attach every tipset's messages to its blocks. All or nothing: a
    /// single unresolvable include list fails the whole chain, so a
    /// half-materialized segment can never leak out.
    pub fn into_full_tipsets(self) -> Result<Vec<FullTipset>, Error> {
        if self.tipsets.is_empty() {
            return Err(Error::ProtocolViolation(
                "no headers to attach messages to".to_string(),
            ));
        }
        if self.messages.len() != self.tipsets.len() {
            return Err(Error::ProtocolViolation(format!(
                "{} message payloads for {} tipsets",
                self.messages.len(),
                self.tipsets.len()
            )));
        }
        self.tipsets
            .iter()
            .zip(self.messages.iter())
            .map(|(tipset, msgs)| msgs.unpack(tipset))
            .collect()
    }
}

/// Requesting-side check of a peer's reply. Classifies the status code,
/// then verifies the payload actually matches what the status claims:
/// an `Ok` chain must be exactly as long as requested, a `Partial`
/// chain must be a non-empty prefix, and both must start at the head we
/// asked about. Any mismatch is a protocol violation regardless of the
/// status the peer reported.
pub fn validate_response(req: &GetChainData, res: ChainData) -> Result<ValidatedChain, Error> {
    let status = res.status();
    match status {
        ExchangeStatus::Ok | ExchangeStatus::Partial => {}
        ExchangeStatus::NotFound => return Err(Error::NotFound),
        ExchangeStatus::GoAway => return Err(Error::GoAway),
        ExchangeStatus::InternalError => {
            return Err(Error::RemoteInternalError(res.error_message))
        }
        ExchangeStatus::BadRequest => return Err(Error::RemoteBadRequest(res.error_message)),
        ExchangeStatus::Unrecognized(code) => {
            warn!("Chain-exchange peer sent unknown status code {}", code);
            return Err(Error::UnrecognizedStatus(code));
        }
    }

    let partial = status == ExchangeStatus::Partial;
    let flags = req.flags();
    let returned = res.chain.len() as u64;

    if partial {
        if returned == 0 || returned > req.length {
            warn!(
                "Chain-exchange peer sent a Partial response with {} tipsets of {} requested",
                returned, req.length
            );
            return Err(Error::ProtocolViolation(format!(
                "Partial response carries {} tipsets, requested at most {}",
                returned, req.length
            )));
        }
    } else if returned != req.length {
        warn!(
            "Chain-exchange peer claimed Ok but sent {} tipsets of {} requested",
            returned, req.length
        );
        return Err(Error::ProtocolViolation(format!(
            "Ok response carries {} tipsets, requested {}",
            returned, req.length
        )));
    }

    let mut tipsets = Vec::with_capacity(res.chain.len());
    let mut messages = Vec::with_capacity(res.chain.len());
    for (i, bundle) in res.chain.into_iter().enumerate() {
        if flags.include_messages {
            match bundle.messages {
                Some(msgs) => messages.push(msgs),
                None => {
                    warn!(
                        "Chain-exchange peer omitted messages for tipset {} of a message request",
                        i
                    );
                    return Err(Error::ProtocolViolation(format!(
                        "tipset {i} is missing its compacted messages"
                    )));
                }
            }
        }
        if flags.include_headers {
            let tipset = Tipset::new(bundle.headers)
                .map_err(|e| Error::ProtocolViolation(format!("tipset {i} is malformed: {e}")))?;
            tipsets.push(tipset);
        }
    }

    // the walk starts at the head the caller named, so the first entry
    // must be that exact tipset
    if flags.include_headers {
        let first_key = tipsets[0].key();
        if first_key.block_ids() != &req.head[..] {
            warn!(
                "Chain-exchange peer answered for head {} instead of {}",
                first_key,
                TipsetKey::new(req.head.clone())
            );
            return Err(Error::ProtocolViolation(
                "response does not start at the requested head".to_string(),
            ));
        }
    }

    Ok(ValidatedChain {
        tipsets,
        messages,
        partial,
    })
}
