//! HTML report generation with D3.js visualizations

use super::{MovieReport, Summary};
use std::io::{self, Write};

pub fn write<W: Write>(writer: &mut W, reports: &[MovieReport]) -> io::Result<()> {
    let summary = Summary::from_reports(reports);

    // Biggest casts first, failures last
    let mut sorted: Vec<&MovieReport> = reports.iter().collect();
    sorted.sort_by_key(|r| std::cmp::Reverse(r.analysis.as_ref().map_or(0, |a| a.characters.len() + 1)));

    let json_data = build_json_data(&sorted)?;

    write!(writer, r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Scriptlens Report</title>
    <script src="https://d3js.org/d3.v7.min.js"></script>
    <style>
        :root {{
            --bg: #0d1117;
            --card: #161b22;
            --border: #30363d;
            --text: #e6edf3;
            --dim: #7d8590;
            --accent: #58a6ff;
            --series-a: rgb(180,60,80);
            --series-b: rgb(60,140,180);
        }}
        * {{ box-sizing: border-box; margin: 0; padding: 0; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans', Helvetica, Arial, sans-serif;
            background: var(--bg);
            color: var(--text);
            line-height: 1.5;
        }}
        .container {{ max-width: 1400px; margin: 0 auto; padding: 2rem; }}
        .header {{
            display: flex;
            align-items: baseline;
            gap: 1rem;
            margin-bottom: 2rem;
            padding-bottom: 1rem;
            border-bottom: 1px solid var(--border);
        }}
        .logo {{ font-size: 2.5rem; font-weight: 800; color: var(--accent); }}
        .subtitle {{ color: var(--dim); }}
        .stats {{
            display: grid;
            grid-template-columns: repeat(4, 1fr);
            gap: 1rem;
            margin-bottom: 2rem;
        }}
        .stat, .card {{
            background: var(--card);
            border: 1px solid var(--border);
            border-radius: 12px;
            padding: 1.5rem;
        }}
        .stat {{ text-align: center; }}
        .stat-value {{ font-size: 3rem; font-weight: 700; line-height: 1; }}
        .stat-label {{ color: var(--dim); font-size: 0.875rem; text-transform: uppercase; margin-top: 0.5rem; }}
        .movie {{ margin-bottom: 3rem; }}
        .movie h2 {{ margin-bottom: 1rem; }}
        .movie .error {{ color: rgb(220,70,60); }}
        .grid {{ display: grid; grid-template-columns: 420px 1fr; gap: 1.5rem; margin-bottom: 1.5rem; }}
        .card-title {{ font-weight: 600; color: var(--dim); margin-bottom: 1rem; }}
        table {{ width: 100%; border-collapse: collapse; font-size: 0.875rem; }}
        th, td {{ padding: 0.35rem 0.6rem; text-align: left; border-bottom: 1px solid var(--border); }}
        td.score {{ color: #0d1117; font-weight: 600; text-align: right; }}
        svg text {{ fill: var(--dim); font-size: 11px; }}
        .axis path, .axis line {{ stroke: var(--border); }}
        .tooltip {{
            position: fixed;
            pointer-events: none;
            background: var(--card);
            border: 1px solid var(--border);
            border-radius: 6px;
            padding: 0.5rem 0.75rem;
            max-width: 420px;
            font-size: 0.8rem;
            opacity: 0;
        }}
        .footer {{ color: var(--dim); font-size: 0.8rem; text-align: center; margin-top: 2rem; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <div class="logo">Scriptlens</div>
            <div class="subtitle">Sentiment and character interactions in movie scripts</div>
        </div>

        <div class="stats">
            <div class="stat"><div class="stat-value">{total}</div><div class="stat-label">Documents</div></div>
            <div class="stat"><div class="stat-value">{loaded}</div><div class="stat-label">Analyzed</div></div>
            <div class="stat"><div class="stat-value">{failed}</div><div class="stat-label">Failed</div></div>
            <div class="stat"><div class="stat-value">{characters}</div><div class="stat-label">Characters</div></div>
        </div>

        <div id="movies"></div>

        <div class="footer">Generated by Scriptlens {version}</div>
    </div>

    <div class="tooltip" id="tooltip"></div>

    <script>
    const data = {json_data};

    const tooltip = d3.select('#tooltip');
    function showTooltip(event, text) {{
        tooltip.style('opacity', 1)
            .style('left', (event.clientX + 12) + 'px')
            .style('top', (event.clientY + 12) + 'px')
            .text(text);
    }}
    function hideTooltip() {{ tooltip.style('opacity', 0); }}
    function formatLabel(text) {{
        return text.length > 100 ? text.substring(0, 100) + '...' : text;
    }}

    // Line chart; null values are gaps, spanned by the line
    function drawSeries(container, title, labels, series, lines) {{
        const card = container.append('div').attr('class', 'card');
        card.append('div').attr('class', 'card-title').text(title);
        const width = 860, height = 260, margin = {{ top: 10, right: 20, bottom: 30, left: 40 }};
        const svg = card.append('svg').attr('viewBox', `0 0 ${{width}} ${{height}}`).attr('width', '100%');

        const x = d3.scaleLinear()
            .domain(d3.extent(labels.length ? labels : [0, 1]))
            .range([margin.left, width - margin.right]);
        const y = d3.scaleLinear().domain([-1, 1]).range([height - margin.bottom, margin.top]);

        svg.append('g').attr('class', 'axis')
            .attr('transform', `translate(0,${{height - margin.bottom}})`)
            .call(d3.axisBottom(x).ticks(10));
        svg.append('g').attr('class', 'axis')
            .attr('transform', `translate(${{margin.left}},0)`)
            .call(d3.axisLeft(y).ticks(5));

        for (const s of series) {{
            const points = s.values.map((v, i) => [labels[i], v, i]).filter(p => p[1] !== null);
            svg.append('path')
                .datum(points)
                .attr('fill', 'none')
                .attr('stroke', s.color)
                .attr('stroke-width', s.width || 1.5)
                .attr('d', d3.line().x(p => x(p[0])).y(p => y(p[1])));
            if (s.points) {{
                svg.selectAll(null).data(points).enter().append('circle')
                    .attr('cx', p => x(p[0])).attr('cy', p => y(p[1])).attr('r', 2.5)
                    .attr('fill', s.color)
                    .on('mouseover', (event, p) => showTooltip(event, formatLabel(lines[p[2]])))
                    .on('mouseout', hideTooltip);
            }}
        }}
    }}

    function drawTable(container, rows) {{
        const card = container.append('div').attr('class', 'card');
        card.append('div').attr('class', 'card-title').text('Characters');
        const table = card.append('table');
        table.append('thead').append('tr').selectAll('th')
            .data(['#', 'Name', 'Lines', 'Avg. sentiment']).enter().append('th').text(d => d);
        const tr = table.append('tbody').selectAll('tr').data(rows).enter().append('tr');
        tr.append('td').text(r => r.rank);
        tr.append('td').text(r => r.name);
        tr.append('td').text(r => r.line_count);
        tr.append('td').attr('class', 'score').style('background-color', r => r.color).text(r => r.avg_cs_rounded);
    }}

    function drawGraph(container, graph) {{
        const card = container.append('div').attr('class', 'card');
        card.append('div').attr('class', 'card-title').text('Social graph');
        const width = 860, height = 420;
        const svg = card.append('svg').attr('viewBox', `0 0 ${{width}} ${{height}}`).attr('width', '100%');
        const nodes = graph.nodes.map(n => Object.assign({{}}, n));
        const links = graph.edges.map(e => Object.assign({{}}, e));
        const maxEdge = d3.max(links, l => l.size) || 1;
        const maxNode = d3.max(nodes, n => n.size) || 1;

        const link = svg.append('g').selectAll('line').data(links).enter().append('line')
            .attr('stroke', l => l.color)
            .attr('stroke-width', l => 1 + 9 * l.size / maxEdge);
        const node = svg.append('g').selectAll('g').data(nodes).enter().append('g');
        node.append('circle').attr('r', n => 4 + 26 * n.size / maxNode).attr('fill', n => n.color);
        node.append('text').attr('dy', '0.35em').attr('text-anchor', 'middle').text(n => n.label);
        node.on('mouseover', (event, n) => showTooltip(event, `${{n.label}}: ${{n.line_count}} lines`))
            .on('mouseout', hideTooltip);

        d3.forceSimulation(nodes)
            .force('link', d3.forceLink(links).id(n => n.id).distance(140))
            .force('charge', d3.forceManyBody().strength(-400))
            .force('center', d3.forceCenter(width / 2, height / 2))
            .on('tick', () => {{
                link.attr('x1', l => l.source.x).attr('y1', l => l.source.y)
                    .attr('x2', l => l.target.x).attr('y2', l => l.target.y);
                node.attr('transform', n => `translate(${{n.x}},${{n.y}})`);
            }});
    }}

    function drawMovie(movie) {{
        const section = d3.select('#movies').append('div').attr('class', 'movie');
        const a = movie.analysis;
        section.append('h2').text(a && a.summary.title ? a.summary.title : movie.file_name);
        if (!a) {{
            section.append('div').attr('class', 'error').text(movie.error);
            return;
        }}

        const grid = section.append('div').attr('class', 'grid');
        drawTable(grid, a.characters);
        drawGraph(grid, a.graph);

        const d = a.directions;
        drawSeries(section, 'Sentiment of directions over the course of the movie', d.timeline.line_indices, [
            {{ values: d.timeline.scores, color: 'rgba(60,140,180,0.35)', points: true }},
            {{ values: d.smoothed, color: 'rgb(60,140,180)', width: 2.5 }}
        ], d.timeline.lines);

        const p = a.featured_pair;
        if (p && p.result.outcome === 'interactions') {{
            const r = p.result;
            drawSeries(section,
                `${{p.a}} and ${{p.b}}: ${{p.exchanges}} adjacent dialogue lines, average ${{p.average_score}}`,
                r.line_indices, [
                    {{ values: r.scores_a, color: 'rgba(180,60,80,0.35)', points: true }},
                    {{ values: r.scores_b, color: 'rgba(60,140,180,0.35)', points: true }},
                    {{ values: p.smoothed_a, color: 'var(--series-a)', width: 2.5 }},
                    {{ values: p.smoothed_b, color: 'var(--series-b)', width: 2.5 }}
                ], r.lines);
        }} else if (p) {{
            section.append('div').attr('class', 'card').text(`${{p.a}} and ${{p.b}}: no interactions.`);
        }}
    }}

    data.movies.forEach(drawMovie);
    </script>
</body>
</html>
"#,
        total = summary.total,
        loaded = summary.loaded,
        failed = summary.failed,
        characters = summary.characters,
        version = env!("CARGO_PKG_VERSION"),
        json_data = json_data
    )?;

    Ok(())
}

/// Report data embedded in the page's script
fn build_json_data(reports: &[&MovieReport]) -> io::Result<String> {
    let json = serde_json::to_string(&serde_json::json!({ "movies": reports }))?;
    Ok(script_safe(&json))
}

/// Keep embedded JSON from closing the surrounding script element
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::{failed_report, sample_report};

    fn render(reports: &[MovieReport]) -> String {
        let mut buf = Vec::new();
        write(&mut buf, reports).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_html_embeds_data() {
        let html = render(&[sample_report()]);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("const data = {\"movies\":["));
        assert!(html.contains("\"name\":\"LUKE\""));
        assert!(html.contains("data.movies.forEach(drawMovie);"));
    }

    #[test]
    fn test_html_summary_cards() {
        let html = render(&[sample_report(), failed_report()]);
        assert!(html.contains(r#"<div class="stat-value">2</div><div class="stat-label">Documents</div>"#));
        assert!(html.contains(r#"<div class="stat-value">1</div><div class="stat-label">Failed</div>"#));
    }

    #[test]
    fn test_failures_sorted_last() {
        let html = render(&[failed_report(), sample_report()]);
        let sample = html.find("sample.json").unwrap();
        let broken = html.find("broken.json").unwrap();
        assert!(sample < broken);
    }

    #[test]
    fn test_script_safe() {
        assert_eq!(script_safe(r#"{"line":"</script>"}"#), r#"{"line":"<\/script>"}"#);
    }
}
