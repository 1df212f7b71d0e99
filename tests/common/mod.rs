use jvo_mirror::domain::ProjectCode;

pub fn project() -> ProjectCode {
    "2017.1.01310.S".parse().unwrap()
}

/// Row shaped like the portal's offset layout: the anchor cell followed
/// by fifteen sibling cells, with target name, cube size and member uid
/// at their fixed distances.
pub fn offset_row(id: &str, source: &str, target: &str, cube: &str, member: &str) -> String {
    let mut cells = vec![format!(r##"<td><a id="{id}" href="#">{source}</a></td>"##)];
    for i in 1..=15 {
        let text = match i {
            7 => target,
            8 => cube,
            15 => member,
            _ => "-",
        };
        cells.push(format!("<td>{text}</td>"));
    }
    format!("<tr>{}</tr>", cells.concat())
}

pub fn offset_page(rows: &[String]) -> String {
    format!(
        "<html><body><table>{}</table></body></html>",
        rows.concat()
    )
}
