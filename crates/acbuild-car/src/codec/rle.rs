//! RLE pixel blocks: per-row deltas followed by PackBits byte runs.
//!
//! Each row is stored as its wrapping byte-wise difference from the row
//! above (the first row differs from an all-zero row), which turns the flat
//! regions and vertical gradients common in UI art into long runs. The
//! delta buffer is then PackBits coded: a control byte `0..=127` is a
//! literal run of `n + 1` bytes, `129..=255` repeats the next byte
//! `257 - n` times, `128` is a no-op.

use crate::error::{CarError, Result};

const MAX_RUN: usize = 128;

pub fn compress(data: &[u8], row_bytes: usize) -> Vec<u8> {
    let deltas = encode_deltas(data, row_bytes);
    pack(&deltas)
}

pub fn decompress(data: &[u8], row_bytes: usize, expected_len: usize) -> Result<Vec<u8>> {
    let deltas = unpack(data, expected_len)?;
    Ok(decode_deltas(&deltas, row_bytes))
}

fn encode_deltas(data: &[u8], row_bytes: usize) -> Vec<u8> {
    if row_bytes == 0 || data.len() <= row_bytes {
        return data.to_vec();
    }
    let mut out = Vec::with_capacity(data.len());
    out.extend_from_slice(&data[..row_bytes]);
    for i in row_bytes..data.len() {
        out.push(data[i].wrapping_sub(data[i - row_bytes]));
    }
    out
}

fn decode_deltas(deltas: &[u8], row_bytes: usize) -> Vec<u8> {
    if row_bytes == 0 || deltas.len() <= row_bytes {
        return deltas.to_vec();
    }
    let mut out = Vec::with_capacity(deltas.len());
    out.extend_from_slice(&deltas[..row_bytes]);
    for i in row_bytes..deltas.len() {
        let above = out[i - row_bytes];
        out.push(deltas[i].wrapping_add(above));
    }
    out
}

fn pack(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 2 + 8);
    let mut at = 0;

    while at < data.len() {
        // Measure the run starting here.
        let mut run = 1;
        while at + run < data.len() && data[at + run] == data[at] && run < MAX_RUN {
            run += 1;
        }

        if run >= 3 {
            out.push((257 - run) as u8);
            out.push(data[at]);
            at += run;
            continue;
        }

        // Literal stretch: scan forward until a run of 3 starts or the
        // literal limit is reached.
        let start = at;
        let mut end = at + run;
        while end < data.len() && end - start < MAX_RUN {
            let mut next_run = 1;
            while end + next_run < data.len()
                && data[end + next_run] == data[end]
                && next_run < 3
            {
                next_run += 1;
            }
            if next_run >= 3 {
                break;
            }
            end += 1;
        }
        let literal = &data[start..end.min(start + MAX_RUN)];
        out.push((literal.len() - 1) as u8);
        out.extend_from_slice(literal);
        at = start + literal.len();
    }

    out
}

fn unpack(data: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected_len);
    let mut at = 0;

    while at < data.len() {
        let control = data[at];
        at += 1;
        match control {
            0..=127 => {
                let count = control as usize + 1;
                let literal = data.get(at..at + count).ok_or_else(|| {
                    CarError::Corrupt("rle literal run past end of block".into())
                })?;
                out.extend_from_slice(literal);
                at += count;
            }
            128 => {}
            129..=255 => {
                let count = 257 - control as usize;
                let byte = *data
                    .get(at)
                    .ok_or_else(|| CarError::Corrupt("rle repeat run past end of block".into()))?;
                out.extend(std::iter::repeat(byte).take(count));
                at += 1;
            }
        }
        if out.len() > expected_len {
            return Err(CarError::Corrupt(format!(
                "rle block expands past {expected_len} bytes"
            )));
        }
    }

    Ok(out)
}
