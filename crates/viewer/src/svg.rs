use graphvis_layout::{Canvas, Graph};

/// Escape text for use inside SVG element content and attributes.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Draw the graph as it currently sits on `canvas`: edges as straight
/// lines between node outlines (with an arrowhead when directed), nodes as
/// labelled circles, weights next to their node or edge midpoint.
pub fn render_svg(graph: &Graph, canvas: &Canvas) -> String {
    let mut svg = format!(
        r#"<svg width="{}" height="{}" xmlns="http://www.w3.org/2000/svg">
<defs>
<marker id="arrow" viewBox="0 0 10 10" refX="10" refY="5" markerWidth="8" markerHeight="8" orient="auto-start-reverse">
<path d="M 0 0 L 10 5 L 0 10 z" fill="black"/>
</marker>
</defs>
<rect width="100%" height="100%" fill="white"/>
"#,
        canvas.width, canvas.height
    );

    for edge in graph.edges() {
        let (Some(from), Some(to)) = (graph.node(edge.from()), graph.node(edge.to())) else {
            continue;
        };
        let start = from.edge_point_towards(to.center());
        let end = to.edge_point_towards(from.center());
        let marker = if edge.directed() {
            r#" marker-end="url(#arrow)""#
        } else {
            ""
        };
        svg.push_str(&format!(
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="black" stroke-width="2"{}/>
"#,
            start.x, start.y, end.x, end.y, marker
        ));
        if let Some(weight) = edge.weight() {
            let mid = start.midpoint(end);
            svg.push_str(&format!(
                r#"<text x="{:.2}" y="{:.2}" font-family="Arial" font-size="11" fill="dimgray" text-anchor="middle">{}</text>
"#,
                mid.x,
                mid.y - 4.0,
                escape(weight)
            ));
        }
    }

    for node in graph.nodes() {
        let c = node.center();
        svg.push_str(&format!(
            r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="lightblue" stroke="black"/>
<text x="{:.2}" y="{:.2}" font-family="Arial" font-size="12" text-anchor="middle">{}</text>
"#,
            c.x,
            c.y,
            node.radius(),
            c.x,
            c.y + 4.0,
            escape(node.label())
        ));
        if let Some(weight) = node.weight() {
            svg.push_str(&format!(
                r#"<text x="{:.2}" y="{:.2}" font-family="Arial" font-size="10" fill="dimgray" text-anchor="middle">{}</text>
"#,
                c.x,
                c.y + 18.0,
                escape(weight)
            ));
        }
    }

    svg.push_str("</svg>\n");
    svg
}
