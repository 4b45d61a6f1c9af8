//! Label map generation for the TensorFlow object detection API
//!
//! The label map is a protobuf text file that assigns 1-based ids to the
//! dataset's labels in the order given.

/// Build label map text from an ordered list of labels
///
/// Labels are written verbatim. A label containing `'` or a newline produces
/// a label map the object detection API cannot read.
///
/// # Examples
/// ```
/// use fmltc_util::utils::label_map::make_label_map;
///
/// let text = make_label_map(&["cat", "dog"]);
/// assert_eq!(text, "item {\n  id: 1\n  name:'cat'\n}\nitem {\n  id: 2\n  name:'dog'\n}\n");
/// ```
pub fn make_label_map<S: AsRef<str>>(labels: &[S]) -> String {
    let mut label_map = String::new();
    for (i, label) in labels.iter().enumerate() {
        label_map.push_str(&format!(
            "item {{\n  id: {}\n  name:'{}'\n}}\n",
            i + 1,
            label.as_ref()
        ));
    }
    label_map
}
