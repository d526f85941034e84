//! Big-endian, length-prefixed decoder for the `extraData` tail the
//! host limit-order protocol hands to the pre/post-interaction
//! callbacks. Kept as its own module with exhaustive boundary tests
//! rather than ad-hoc parsing at the call sites, per §9.

use thiserror::Error;

use crate::immutables::{Address, TokenId};
use crate::order::auction::AuctionPoint;

pub type CodecResult<T> = std::result::Result<T, CodecError>;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    #[error("extraData ended before the expected field could be read")]
    UnexpectedEof,

    #[error("extraData has bytes left over after the last recognized field")]
    TrailingBytes,
}

/// Decoded view of `extraData`. Field order and widths mirror §4.G's
/// layout table exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcEscrowArgs {
    pub order_hash: [u8; 32],
    pub hashlock: [u8; 32],
    pub maker: Address,
    pub token_id: TokenId,
    pub amount: u64,
    pub safety_deposit: u64,
    pub timelocks_raw: [u8; 32],
    pub dst_chain_id: u16,
    pub dst_token_id: TokenId,
    pub dst_amount: u64,
    pub dst_safety_deposit: u64,
    pub parts_count: u16,
    pub merkle_root: Option<[u8; 32]>,
    pub auction_points: Vec<AuctionPoint>,
}

/// Minimal cursor over a byte slice, tracking only a read offset —
/// every `take_*` call either advances it or fails with
/// [`CodecError::UnexpectedEof`], never panics.
struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let end = self.offset.checked_add(len).ok_or(CodecError::UnexpectedEof)?;
        let slice = self.bytes.get(self.offset..end).ok_or(CodecError::UnexpectedEof)?;
        self.offset = end;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let slice = self.take(N)?;
        slice.try_into().map_err(|_| CodecError::UnexpectedEof)
    }

    fn take_u16(&mut self) -> CodecResult<u16> {
        Ok(u16::from_be_bytes(self.take_array()?))
    }

    fn take_u64(&mut self) -> CodecResult<u64> {
        Ok(u64::from_be_bytes(self.take_array()?))
    }

    fn take_address(&mut self) -> CodecResult<Address> {
        Ok(Address(self.take_array()?))
    }

    fn take_token_id(&mut self) -> CodecResult<TokenId> {
        Ok(TokenId(self.take_array()?))
    }

    fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.offset..]
    }
}

/// Each point is `[4 delay][8 price]`, and the section itself is
/// length-prefixed by a 2-byte point count.
fn decode_auction_points(cursor: &mut Cursor) -> CodecResult<Vec<AuctionPoint>> {
    let count = cursor.take_u16()? as usize;
    let mut points = Vec::with_capacity(count);
    for _ in 0..count {
        let delay = u32::from_be_bytes(cursor.take_array()?);
        let price = cursor.take_u64()?;
        points.push(AuctionPoint { delay, price });
    }
    Ok(points)
}

pub fn decode_src_escrow_args(data: &[u8]) -> CodecResult<SrcEscrowArgs> {
    let mut cursor = Cursor::new(data);

    let order_hash = cursor.take_array()?;
    let hashlock = cursor.take_array()?;
    let maker = cursor.take_address()?;
    let token_id = cursor.take_token_id()?;
    let amount = cursor.take_u64()?;
    let safety_deposit = cursor.take_u64()?;
    let timelocks_raw = cursor.take_array()?;
    let dst_chain_id = cursor.take_u16()?;
    let dst_token_id = cursor.take_token_id()?;
    let dst_amount = cursor.take_u64()?;
    let dst_safety_deposit = cursor.take_u64()?;
    let parts_count = cursor.take_u16()?;

    let merkle_root = if parts_count > 0 { Some(cursor.take_array()?) } else { None };

    let auction_points = decode_auction_points(&mut cursor)?;

    if !cursor.remaining().is_empty() {
        return Err(CodecError::TrailingBytes);
    }

    Ok(SrcEscrowArgs {
        order_hash,
        hashlock,
        maker,
        token_id,
        amount,
        safety_deposit,
        timelocks_raw,
        dst_chain_id,
        dst_token_id,
        dst_amount,
        dst_safety_deposit,
        parts_count,
        merkle_root,
        auction_points,
    })
}
