//! Windows code page decoding for 8-bit (`PT_STRING8`) property values.

use tracing::warn;

/// Code page assumed when a message does not declare one.
pub const DEFAULT_CODEPAGE: u32 = 1252;

/// Decode `bytes` using the Windows code page `codepage`.
///
/// Unknown code pages fall back to Windows-1252 (never fails).
pub fn decode(codepage: u32, bytes: &[u8]) -> String {
    let encoding = match encoding_for(codepage) {
        Some(encoding) => encoding,
        None => {
            warn!(codepage, "Unknown code page, falling back to windows-1252");
            encoding_rs::WINDOWS_1252
        }
    };
    let (decoded, _, _) = encoding.decode(bytes);
    decoded.into_owned()
}

/// Map a Windows code page identifier to an `encoding_rs` encoding.
pub fn encoding_for(codepage: u32) -> Option<&'static encoding_rs::Encoding> {
    let label: &[u8] = match codepage {
        65001 => return Some(encoding_rs::UTF_8),
        1200 => return Some(encoding_rs::UTF_16LE),
        1201 => return Some(encoding_rs::UTF_16BE),
        20127 | 1252 => return Some(encoding_rs::WINDOWS_1252),
        874 => b"windows-874",
        932 => b"shift_jis",
        936 => b"gbk",
        949 => b"euc-kr",
        950 => b"big5",
        1250..=1258 => return windows_codepage(codepage),
        20866 => b"koi8-r",
        21866 => b"koi8-u",
        28591 => b"iso-8859-1",
        28592 => b"iso-8859-2",
        28593 => b"iso-8859-3",
        28594 => b"iso-8859-4",
        28595 => b"iso-8859-5",
        28596 => b"iso-8859-6",
        28597 => b"iso-8859-7",
        28598 => b"iso-8859-8",
        28599 => b"iso-8859-9",
        28603 => b"iso-8859-13",
        28605 => b"iso-8859-15",
        50220..=50222 => b"iso-2022-jp",
        51932 => b"euc-jp",
        51949 => b"euc-kr",
        54936 => b"gb18030",
        10000 => b"macintosh",
        _ => return None,
    };
    encoding_rs::Encoding::for_label(label)
}

fn windows_codepage(codepage: u32) -> Option<&'static encoding_rs::Encoding> {
    encoding_rs::Encoding::for_label(format!("windows-{codepage}").as_bytes())
}
