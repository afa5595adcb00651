//! Program image loading
//!
//! Images are line-oriented text. A line beginning with `@` sets the
//! load address (hex digits, no 0x prefix); any other non-blank line
//! holds whitespace-separated two-hex-digit byte tokens, stored at
//! consecutive addresses from the current load position. Blank lines
//! are ignored.
//!
//! Images that supply byte data before the first `@` directive, or
//! that place bytes outside simulated memory, are rejected instead of
//! being loaded at an undefined position.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use log::debug;
use thiserror::Error;

use crate::hart::memory::{Memory, Wordsize};

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("line {line}: bad load address {text:?}")]
    BadAddress { line: usize, text: String },
    #[error("line {line}: bad byte token {token:?}")]
    BadByte { line: usize, token: String },
    #[error("line {line}: byte data before any @address directive")]
    MissingLoadAddress { line: usize },
    #[error("line {line}: load address 0x{addr:08x} is outside simulated memory")]
    OutOfRange { line: usize, addr: u32 },
    #[error("failed to read image: {0}")]
    Io(#[from] io::Error),
}

/// Load a hex-record image into memory, returning the number of bytes
/// stored
pub fn load_image<R: BufRead>(reader: R, memory: &mut Memory) -> Result<u32, ImageError> {
    let mut load_address: Option<u32> = None;
    let mut bytes_loaded = 0;

    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        // Line numbers in diagnostics are 1-based
        let line_number = n + 1;

        if line.is_empty() {
            continue;
        }

        if let Some(addr_text) = line.strip_prefix('@') {
            let addr =
                u32::from_str_radix(addr_text, 16).map_err(|_| ImageError::BadAddress {
                    line: line_number,
                    text: addr_text.to_string(),
                })?;
            load_address = Some(addr);
            continue;
        }

        let addr = load_address.as_mut().ok_or(ImageError::MissingLoadAddress {
            line: line_number,
        })?;
        for token in line.split_whitespace() {
            let byte = u8::from_str_radix(token, 16).map_err(|_| ImageError::BadByte {
                line: line_number,
                token: token.to_string(),
            })?;
            memory
                .write(*addr, byte.into(), Wordsize::Byte)
                .map_err(|_| ImageError::OutOfRange {
                    line: line_number,
                    addr: *addr,
                })?;
            *addr = addr.wrapping_add(1);
            bytes_loaded += 1;
        }
    }

    debug!("loaded {bytes_loaded} bytes from image");
    Ok(bytes_loaded)
}

/// Open a hex-record image file and load it into memory
pub fn load_image_file<P: AsRef<Path>>(path: P, memory: &mut Memory) -> Result<u32, ImageError> {
    let file = File::open(path)?;
    load_image(BufReader::new(file), memory)
}
