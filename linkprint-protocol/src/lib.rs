//! Game Boy Printer link protocol
//!
//! This crate decodes the byte stream a Game Boy sends to its printer over
//! the link cable. It has no knowledge of pins or timing: bytes go in, ready
//! packets and image tiles come out.
//!
//! # Protocol Overview
//!
//! Every exchange is one packet:
//! ```text
//! ┌───────────┬─────┬──────┬────────┬──────────┬──────────┬───────────┐
//! │ SYNC      │ CMD │ COMP │ LENGTH │ PAYLOAD  │ CHECKSUM │ KEEPALIVE │
//! │ 0x88 0x33 │ 1B  │ 1B   │ 2B LE  │ 0–640B   │ 2B LE    │ 1B        │
//! └───────────┴─────┴──────┴────────┴──────────┴──────────┴───────────┘
//! ```
//!
//! The printer answers each packet with a status byte (see [`Status`]).
//! DATA payloads carry 16-byte tiles, optionally run-length compressed
//! (see [`tile`]).

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod packet;
pub mod print;
pub mod printer;
pub mod status;
pub mod tile;

pub use command::Command;
pub use packet::{
    checksum, encode, encode_to_vec, EncodeError, Packet, PacketParser, ParseState, PayloadStream,
    MAX_PAYLOAD_SIZE, PACKET_OVERHEAD, SYNC_0, SYNC_1,
};
pub use print::PrintParams;
pub use printer::PrinterState;
pub use status::{Status, StatusFlags};
pub use tile::{
    compress, decode_payload, CompressError, Tile, TileAccumulator, TileDecompressor,
    TILE_SIZE,
};
