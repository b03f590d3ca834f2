//! Session segmentation of the interleaved text log.
//!
//! The instrument appends every logging session to the same file. Each
//! session starts with an `OPEN <version>` banner line and some preamble,
//! then a `$STARTOFDATA$` line followed by the table header and rows.
//! Splitting on the two markers yields one table body per session. The end
//! marker only counts at the start of a line, so remarks that mention it do
//! not cut a session short.

/// Lazy iterator over session bodies in a text log.
///
/// Produced by [`split_sessions`]. Each item is the text between a start
/// marker and the next line opening with the end marker, trimmed. Chunks without a start marker or with an empty body
/// are skipped.
#[derive(Debug, Clone)]
pub struct Sessions<'a> {
    rest: &'a str,
    start_marker: &'a str,
    end_marker: &'a str,
    exhausted: bool,
}

impl<'a> Sessions<'a> {
    fn next_chunk(&mut self) -> Option<&'a str> {
        if self.exhausted {
            return None;
        }

        let end = if self.end_marker.is_empty() {
            None
        } else {
            find_marker_line(self.rest, self.end_marker)
        };

        match end {
            Some((line_start, marker_end)) => {
                let chunk = &self.rest[..line_start];
                self.rest = &self.rest[marker_end..];
                Some(chunk)
            }
            None => {
                self.exhausted = true;
                Some(self.rest)
            }
        }
    }
}

impl<'a> Iterator for Sessions<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let chunk = self.next_chunk()?;
            if let Some(body) = session_body(chunk, self.start_marker) {
                return Some(body);
            }
        }
    }
}

/// Split a text log into per-session table bodies.
///
/// # Example
///
/// ```
/// use gasex_tidy::processors::segmenter::split_sessions;
///
/// let log = "OPEN 6.2\npreamble\n$STARTOFDATA$\nObs\tHHMMSS\n1\t10:00:00\n\
///            OPEN 6.2\nnothing logged\n\
///            OPEN 6.2\n$STARTOFDATA$\nObs\tHHMMSS\n1\t11:00:00\n";
/// let bodies: Vec<_> = split_sessions(log, "$STARTOFDATA$", "OPEN").collect();
/// assert_eq!(bodies.len(), 2);
/// assert!(bodies[0].starts_with("Obs"));
/// ```
pub fn split_sessions<'a>(text: &'a str, start_marker: &'a str, end_marker: &'a str) -> Sessions<'a> {
    Sessions {
        rest: text,
        start_marker,
        end_marker,
        exhausted: false,
    }
}

/// Locate the first line that opens with `marker`, ignoring leading
/// whitespace and quotes.
///
/// Returns the byte offset of the line start and of the end of the marker.
fn find_marker_line(text: &str, marker: &str) -> Option<(usize, usize)> {
    let mut line_start = 0;
    for line in text.split_inclusive('\n') {
        let content = line.trim_start().trim_start_matches('"');
        if content.starts_with(marker) {
            let marker_end = line_start + (line.len() - content.len()) + marker.len();
            return Some((line_start, marker_end));
        }
        line_start += line.len();
    }
    None
}

/// Extract the table body from one chunk, or `None` if it holds no data.
fn session_body<'a>(chunk: &'a str, start_marker: &str) -> Option<&'a str> {
    let idx = chunk.find(start_marker)?;
    let after_marker = &chunk[idx + start_marker.len()..];

    // Drop the remainder of the start marker's own line
    let body = match after_marker.find('\n') {
        Some(nl) => after_marker[nl + 1..].trim(),
        None => "",
    };

    if body.is_empty() {
        None
    } else {
        Some(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "$STARTOFDATA$";
    const END: &str = "OPEN";

    #[test]
    fn test_split_sessions_strips_preamble() {
        let log = "\"OPEN 6.2.4\"\n\"Thr Aug 12 2021 09:14:21\"\n\"$STARTOFDATA$\"\n\
                   \"Obs\"\t\"HHMMSS\"\n1\t\"09:21:01\"\n";
        let bodies: Vec<_> = split_sessions(log, START, END).collect();

        assert_eq!(bodies, vec!["\"Obs\"\t\"HHMMSS\"\n1\t\"09:21:01\""]);
    }

    #[test]
    fn test_split_sessions_multiple_sessions_in_order() {
        let log = "\"OPEN 6.2.4\"\n\"$STARTOFDATA$\"\nObs\tHHMMSS\n1\t09:00:00\n\
                   \"OPEN 6.2.4\"\n\"$STARTOFDATA$\"\nObs\tHHMMSS\n1\t10:00:00\n2\t10:01:00\n";
        let bodies: Vec<_> = split_sessions(log, START, END).collect();

        assert_eq!(bodies.len(), 2);
        assert!(bodies[0].ends_with("09:00:00"));
        assert!(bodies[1].ends_with("10:01:00"));
        // Trailing quote of the next banner must not leak into the body
        assert!(!bodies[0].ends_with('"'));
    }

    #[test]
    fn test_split_sessions_drops_unmatched_and_empty() {
        let log = "header junk without markers\n\
                   OPEN 6.2.4\npreamble only\n\
                   OPEN 6.2.4\n$STARTOFDATA$\n   \n\
                   OPEN 6.2.4\n$STARTOFDATA$\nObs\tHHMMSS\n";
        let bodies: Vec<_> = split_sessions(log, START, END).collect();

        assert_eq!(bodies, vec!["Obs\tHHMMSS"]);
    }

    #[test]
    fn test_split_sessions_is_lazy() {
        let log = "OPEN\n$STARTOFDATA$\nA\nOPEN\n$STARTOFDATA$\nB\n";
        let mut sessions = split_sessions(log, START, END);

        assert_eq!(sessions.next(), Some("A"));
        assert_eq!(sessions.next(), Some("B"));
        assert_eq!(sessions.next(), None);
        assert_eq!(sessions.next(), None);
    }

    #[test]
    fn test_split_sessions_empty_end_marker() {
        let log = "preamble\n$STARTOFDATA$\nObs\n1\n";
        let bodies: Vec<_> = split_sessions(log, START, "").collect();
        assert_eq!(bodies, vec!["Obs\n1"]);
    }

    #[test]
    fn test_split_sessions_marker_inside_remark() {
        let log = "\"OPEN 6.2.4\"\n\"$STARTOFDATA$\"\nObs\tHHMMSS\n1\t09:00:00\n\
                   \"Remark=\"\t\"09:01:00 chamber OPEN for cleaning\"\n\
                   2\t09:02:00\n3\t09:03:00\n\
                   \"OPEN 6.2.4\"\n\"$STARTOFDATA$\"\nObs\tHHMMSS\n1\t10:00:00\n";
        let bodies: Vec<_> = split_sessions(log, START, END).collect();

        assert_eq!(bodies.len(), 2);
        assert!(bodies[0].contains("chamber OPEN for cleaning"));
        assert!(bodies[0].ends_with("3\t09:03:00"));
        assert_eq!(bodies[1], "Obs\tHHMMSS\n1\t10:00:00");
    }

    #[test]
    fn test_find_marker_line_offsets() {
        let text = "a\n  \"OPEN 6\"\nb";
        assert_eq!(find_marker_line(text, "OPEN"), Some((2, 9)));
        assert_eq!(find_marker_line("x OPEN\n", "OPEN"), None);
    }

    #[test]
    fn test_split_sessions_empty_text() {
        assert_eq!(split_sessions("", START, END).count(), 0);
    }
}
