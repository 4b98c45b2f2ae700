use super::edges::CallGraphEdge;

/// Field delimiter of the output record
pub const FIELD_DELIMITER: char = ';';

/// Marker substituted for literal delimiters inside the call-text field.
/// A call text already containing this marker cannot be recovered
/// unambiguously; consumers reverse the substitution as-is.
pub const ESCAPE_MARKER: &str = "&%&";

/// Replace every field delimiter in free text with the escape marker
pub fn escape_call_text(text: &str) -> String {
    text.replace(FIELD_DELIMITER, ESCAPE_MARKER)
}

/// Reverse of `escape_call_text`
pub fn unescape_call_text(text: &str) -> String {
    text.replace(ESCAPE_MARKER, &FIELD_DELIMITER.to_string())
}

/// Render an edge as one delimiter-joined text record:
///
/// callerFile;beginLine;beginCol;endLine;endCol;callText;calleeSignature;
/// calleeQualifiedSignature;calleeFile;calleeBeginLine;calleeBeginCol;
/// calleeEndLine;calleeEndCol
pub fn format_edge(edge: &CallGraphEdge) -> String {
    let fields = [
        edge.caller_file.display().to_string(),
        edge.call_range.begin_line.to_string(),
        edge.call_range.begin_col.to_string(),
        edge.call_range.end_line.to_string(),
        edge.call_range.end_col.to_string(),
        edge.call_text.clone(),
        edge.callee_signature.clone(),
        edge.callee_qualified_signature.clone(),
        edge.callee_file.display().to_string(),
        edge.callee_range.begin_line.to_string(),
        edge.callee_range.begin_col.to_string(),
        edge.callee_range.end_line.to_string(),
        edge.callee_range.end_col.to_string(),
    ];

    fields.join(&FIELD_DELIMITER.to_string())
}
