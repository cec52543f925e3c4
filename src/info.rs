/*
    kryoflux_stream
    Copyright 2026 The kryoflux_stream contributors
    --------------------------------------------------------------------------

    Lookup over the free-form `name=value` pairs carried in the OOB Info
    text, such as the `sck`/`ick` clock overrides the decoder consults when
    finalizing timing constants.
*/

/// Finds `name`'s value within `info_text`, a comma-separated sequence of
/// `name=value` pairs (individual OOB Info payloads are themselves joined
/// with `", "`, but a single payload's own pairs carry no guaranteed space
/// after the comma). The value runs from just after `name=` to the next
/// `,` or end-of-string. Returns `None` if `name` never appears as a whole
/// segment key.
///
/// A match at the very start of `info_text` is accepted on equal footing
/// with any other position: earlier decoders keyed this lookup off the
/// position returned by a substring search and treated position `0` as "not
/// found", silently dropping any key that happened to lead the text.
pub(crate) fn find_info<'a>(info_text: &'a str, name: &str) -> Option<&'a str> {
    for segment in info_text.split(',') {
        let segment = segment.trim_start();
        if let Some((key, value)) = segment.split_once('=') {
            if key == name {
                return Some(value);
            }
        }
    }
    None
}
