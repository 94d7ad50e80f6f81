use std::borrow::Cow;

use unicode_width::UnicodeWidthChar;

/// Canonical form of a category label used for every comparison between
/// article categories and user-chosen labels: surrounding whitespace removed
/// and Unicode-lowercased.
///
/// Both sides of a comparison must go through this function.
///
/// # Examples
///
/// ```
/// use newsdeck::util::normalize_label;
///
/// assert_eq!(normalize_label("  Tech "), "tech");
/// assert_eq!(normalize_label("SPORTS"), "sports");
/// ```
pub fn normalize_label(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Returns true if `s` is absent in all but name: empty or whitespace-only.
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Ellipsis string used for truncation
const ELLIPSIS: &str = "...";
/// Display width of the ellipsis (3 columns for ASCII "...")
const ELLIPSIS_WIDTH: usize = 3;

/// Cuts `s` to at most `max_chars` characters, appending "..." when anything
/// was removed.
///
/// Counts `char`s, not bytes, so multi-byte text never splits mid-codepoint.
/// Returns `Cow::Borrowed` when the input already fits.
///
/// ```
/// use newsdeck::util::preview;
///
/// assert_eq!(preview("short", 10), "short");
/// assert_eq!(preview("abcdef", 3), "abc...");
/// ```
pub fn preview(s: &str, max_chars: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max_chars) {
        None => Cow::Borrowed(s),
        Some((cut, _)) => Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS)),
    }
}

/// Truncates a string to fit within a maximum display width.
///
/// If truncation is necessary, appends "..." to indicate text was cut off.
/// Uses Unicode-aware width calculation so CJK characters and emoji never
/// overflow the column. For widths of 3 or less there is no room for
/// "char + ellipsis", so as many characters as fit are returned bare.
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if max_width == 0 {
        return Cow::Borrowed("");
    }

    if max_width <= ELLIPSIS_WIDTH {
        let mut byte_end = 0;
        let mut current_width = 0;
        for (idx, c) in s.char_indices() {
            let char_width = UnicodeWidthChar::width(c).unwrap_or(0);
            if current_width + char_width > max_width {
                break;
            }
            current_width += char_width;
            byte_end = idx + c.len_utf8();
        }
        if byte_end == s.len() {
            return Cow::Borrowed(s);
        }
        return Cow::Owned(s[..byte_end].to_string());
    }
    let target_width = max_width.saturating_sub(ELLIPSIS_WIDTH);

    let mut current_width = 0;
    let mut cut_point = None;
    let mut exceeded_max = false;

    for (idx, c) in s.char_indices() {
        let char_width = UnicodeWidthChar::width(c).unwrap_or(0);

        if cut_point.is_none() && current_width + char_width > target_width {
            cut_point = Some(idx);
        }

        if current_width + char_width > max_width {
            exceeded_max = true;
            break;
        }

        current_width += char_width;
    }

    if exceeded_max {
        let cut = cut_point.unwrap_or(s.len());
        Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS))
    } else {
        Cow::Borrowed(s)
    }
}

/// Strip terminal control characters and ANSI escape sequences from text.
///
/// Backend strings (titles, category labels) are printed straight to the
/// terminal by the CLI, so escape sequences are removed before display.
///
/// Strips ASCII control chars except tab/newline/CR, CSI sequences
/// (`\x1b[` ... final byte 0x40-0x7E), OSC sequences (`\x1b]` ... BEL or
/// `\x1b\\`) and bare ESC. Returns `Cow::Borrowed` for clean input.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    let len = bytes.len();

    let needs_strip = bytes.iter().any(|&b| is_stripped_byte(b));

    if !needs_strip {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(len);
    let mut i = 0;

    while i < len {
        let b = bytes[i];

        if b == 0x1b {
            if i + 1 < len && bytes[i + 1] == b'[' {
                i += 2;
                while i < len {
                    let c = bytes[i];
                    i += 1;
                    if (0x40..=0x7e).contains(&c) {
                        break;
                    }
                }
            } else if i + 1 < len && bytes[i + 1] == b']' {
                i += 2;
                while i < len {
                    if bytes[i] == 0x07 {
                        i += 1;
                        break;
                    }
                    if bytes[i] == 0x1b && i + 1 < len && bytes[i + 1] == b'\\' {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
            } else {
                i += 1;
            }
        } else if is_stripped_byte(b) {
            i += 1;
        } else {
            let start = i;
            i += 1;
            while i < len && !is_stripped_byte(bytes[i]) {
                i += 1;
            }
            // SAFETY: we only break on ASCII control bytes, which cannot appear
            // mid-codepoint in valid UTF-8, so s[start..i] is valid UTF-8.
            out.push_str(&s[start..i]);
        }
    }

    Cow::Owned(out)
}

fn is_stripped_byte(b: u8) -> bool {
    b == 0x1b || b == 0x7f || (b < 0x20 && b != 0x09 && b != 0x0a && b != 0x0d)
}
