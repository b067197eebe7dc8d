//! Small, pure helpers shared by the viewer and the debug console. Kept
//! free of any UI-framework types so they're trivial to unit test.

/// Printable ASCII, the same range `strings(1)` uses.
pub fn is_printable(byte: u8) -> bool {
    (0x20..=0x7e).contains(&byte)
}

/// Every maximal run of printable bytes of length at least `min_length`,
/// in order, with no overlaps.
pub fn extract_strings(buffer: &[u8], min_length: usize) -> Vec<String> {
    let mut found = Vec::new();
    let mut begin = 0usize;
    let mut inside = false;

    for (i, &byte) in buffer.iter().enumerate() {
        if is_printable(byte) {
            if !inside {
                inside = true;
                begin = i;
            }
            continue;
        }

        if inside && i - begin >= min_length {
            found.push(String::from_utf8_lossy(&buffer[begin..i]).into_owned());
        }
        inside = false;
    }

    if inside && buffer.len() - begin >= min_length {
        found.push(String::from_utf8_lossy(&buffer[begin..]).into_owned());
    }

    found
}

pub fn count_lines(s: &str) -> usize {
    if s.is_empty() {
        0
    } else {
        s.matches('\n').count() + 1
    }
}

pub fn clamp<T: PartialOrd>(v: T, low: T, high: T) -> T {
    if v < low {
        low
    } else if v > high {
        high
    } else {
        v
    }
}

/// Splits `line` into pieces of at most `max_len` bytes each, concatenating
/// back to exactly `line`. A `max_len` of zero is treated as "no wrap".
///
/// Cuts only fall on `char` boundaries (via `char_indices`), so a piece can
/// exceed `max_len` by a few bytes when a single multi-byte char would
/// otherwise straddle the cut; that's preferable to corrupting the UTF-8.
pub fn wrap_line(line: &str, max_len: usize) -> Vec<String> {
    if max_len == 0 {
        return vec![line.to_string()];
    }

    let mut res = Vec::new();
    let mut start = 0;
    let mut current_len = 0;
    for (i, ch) in line.char_indices() {
        let ch_len = ch.len_utf8();
        if current_len > 0 && current_len + ch_len > max_len {
            res.push(line[start..i].to_string());
            start = i;
            current_len = 0;
        }
        current_len += ch_len;
    }
    res.push(line[start..].to_string());
    res
}

/// Puts `target` on the bottom `lines(target)` lines of a `height`-line
/// view, padding `view` with blank lines in between. Returns `view`
/// unchanged if it doesn't fit or `height <= 0`.
pub fn put_on_bottom(view: &str, target: &str, height: i64) -> String {
    if height <= 0 {
        return view.to_string();
    }

    let view_lines = count_lines(view) as i64;
    let target_lines = count_lines(target) as i64;
    if view_lines + target_lines > height {
        return view.to_string();
    }

    let mut pad = "\n".repeat((height - view_lines - target_lines) as usize);
    if view_lines != 0 {
        pad.push('\n');
    }

    format!("{view}{pad}{target}")
}

/// Canonical 16-byte-per-row hexdump: `offset  hex bytes  |ascii|`.
pub fn hexdump(data: &[u8]) -> String {
    let mut out = String::new();
    for (row, chunk) in data.chunks(16).enumerate() {
        let offset = row * 16;
        let mut hex_part = String::new();
        let mut ascii_part = String::new();

        for (i, byte) in chunk.iter().enumerate() {
            if i == 8 {
                hex_part.push(' ');
            }
            hex_part.push_str(&format!("{byte:02x} "));
            ascii_part.push(if is_printable(*byte) { *byte as char } else { '.' });
        }

        out.push_str(&format!("{offset:08x}  {hex_part:<49}|{ascii_part}|\n"));
    }
    out.trim_end_matches('\n').to_string()
}

/// Lowercase hex of the whole payload, with no separators.
pub fn hex_encode(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}
