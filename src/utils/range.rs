/// Resolves an inclusive `start..=stop` range over a sequence of `len` elements.
///
/// Negative offsets count from the end, so -1 is the last element, -2 the penultimate and so
/// forth. Out of range offsets are clamped to the sequence. Returns `None` when the resulting
/// range is empty.
pub fn inclusive(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if start > stop || start >= len {
        return None;
    }

    Some((start as usize, stop as usize))
}

/// Resolves a single, possibly negative, index. `None` when it falls outside the sequence.
pub fn index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let index = if index < 0 { len + index } else { index };

    (0..len).contains(&index).then_some(index as usize)
}
