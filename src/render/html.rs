use crate::model::ChartView;

/// Render a self-contained HTML chart (data embedded as JSON, drawn as SVG).
///
/// Important: we avoid `format!()` because the HTML contains many `{}` from JS
/// template literals (e.g., `${x}`), which would conflict with Rust formatting.
pub fn render_chart_html(chart: &ChartView) -> anyhow::Result<String> {
    // `</` inside a string literal would end the script element early.
    let json = serde_json::to_string(chart)?.replace("</", "<\\/");

    const TEMPLATE: &str = r##"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>perf</title>
<style>
  body { font-family: "Times New Roman", Times, serif; margin: 0; padding: 16px; }
  .summary { display: flex; gap: 16px; flex-wrap: wrap; font-family: system-ui, sans-serif; font-size: 14px; color: #333; }
  .pill { padding: 4px 8px; border: 1px solid #ddd; border-radius: 999px; background: #fafafa; }
  svg text { font-family: "Times New Roman", Times, serif; }
  .axis line, .axis path { stroke: #000; }
  .grid line { stroke: #e5e5e5; }
  table { border-collapse: collapse; margin-top: 12px; font-family: system-ui, sans-serif; }
  th, td { border-bottom: 1px solid #eee; padding: 4px 10px; text-align: left; font-size: 14px; }
  .num { text-align: right; font-variant-numeric: tabular-nums; }
  .muted { color: #777; font-size: 12px; font-family: system-ui, sans-serif; }
</style>
</head>
<body>
<div class="summary" id="summary"></div>
<div id="chart"></div>
<div class="muted" id="note"></div>
<table id="seriesTable">
  <thead>
    <tr><th>label</th><th>dataset</th><th class="num">samples</th><th class="num">points</th></tr>
  </thead>
  <tbody id="seriesBody"></tbody>
</table>

<script>
// Embedded chart data (JSON object literal)
const DATA = __DATA__;

const W = 900, H = 600;
const M = { top: 56, right: 24, bottom: 56, left: 88 };
const PW = W - M.left - M.right, PH = H - M.top - M.bottom;
const NS = "http://www.w3.org/2000/svg";

function el(name, attrs, text) {
  const e = document.createElementNS(NS, name);
  for (const [k, v] of Object.entries(attrs || {})) e.setAttribute(k, v);
  if (text !== undefined) e.textContent = text;
  return e;
}

function escapeHtml(s) {
  return String(s)
    .replaceAll("&", "&amp;")
    .replaceAll("<", "&lt;")
    .replaceAll(">", "&gt;")
    .replaceAll('"', "&quot;")
    .replaceAll("'", "&#39;");
}

function fmt(x) {
  if (x === 0) return "0";
  const a = Math.abs(x);
  if (a >= 1e5 || a < 1e-3) return x.toExponential(0);
  return String(Math.round(x * 1000) / 1000);
}

// Linear ticks at 1/2/5 x 10^k steps.
function linearTicks(lo, hi, n) {
  const span = hi - lo;
  if (!(span > 0)) return [lo];
  const raw = span / n;
  const mag = Math.pow(10, Math.floor(Math.log10(raw)));
  const step = [1, 2, 5, 10].map(m => m * mag).find(s => s >= raw);
  const out = [];
  for (let t = Math.ceil(lo / step) * step; t <= hi + step * 1e-9; t += step) out.push(t);
  return out;
}

function allPoints() {
  return DATA.series.flatMap(s => s.points);
}

function xDomain() {
  const xs = allPoints().map(p => p[0]);
  const max = DATA.x_limit != null ? DATA.x_limit : (xs.length ? Math.max(...xs) : 1);
  return [0, max > 0 ? max : 1];
}

function yDomain() {
  const [x0, x1] = xDomain();
  const ys = allPoints().filter(p => p[0] >= x0 && p[0] <= x1).map(p => p[1]);
  if (DATA.log_y) {
    const pos = ys.filter(y => y > 0);
    if (!pos.length) return [1, 10];
    const lo = Math.pow(10, Math.floor(Math.log10(Math.min(...pos))));
    const hi = Math.pow(10, Math.ceil(Math.log10(Math.max(...pos))));
    return [lo, hi > lo ? hi : lo * 10];
  }
  if (!ys.length) return [0, 1];
  const lo = Math.min(0, ...ys), hi = Math.max(...ys);
  return [lo, hi > lo ? hi * 1.05 : lo + 1];
}

function renderSummary() {
  const t = DATA.totals;
  document.getElementById("summary").innerHTML = `
    <span class="pill">operation: <b>${escapeHtml(DATA.operation)}</b></span>
    <span class="pill">series: <b>${t.series}</b></span>
    <span class="pill">points: <b>${t.points}</b></span>
    <span class="pill">samples: <b>${t.samples}</b></span>
    <span class="pill">y scale: <b>${DATA.log_y ? "log" : "linear"}</b></span>
  `;
}

function renderChart() {
  const [x0, x1] = xDomain();
  const [y0, y1] = yDomain();
  const sx = x => M.left + (x - x0) / (x1 - x0) * PW;
  const sy = DATA.log_y
    ? y => M.top + PH - (Math.log10(y) - Math.log10(y0)) / (Math.log10(y1) - Math.log10(y0)) * PH
    : y => M.top + PH - (y - y0) / (y1 - y0) * PH;

  const svg = el("svg", { width: W, height: H, viewBox: `0 0 ${W} ${H}` });
  const defs = el("defs");
  const clip = el("clipPath", { id: "plot" });
  clip.appendChild(el("rect", { x: M.left, y: M.top, width: PW, height: PH }));
  defs.appendChild(clip);
  svg.appendChild(defs);

  const grid = el("g", { class: "grid" });
  const axis = el("g", { class: "axis" });

  for (const t of linearTicks(x0, x1, 6)) {
    const x = sx(t);
    grid.appendChild(el("line", { x1: x, x2: x, y1: M.top, y2: M.top + PH }));
    axis.appendChild(el("line", { x1: x, x2: x, y1: M.top + PH, y2: M.top + PH + 6 }));
    axis.appendChild(el("text", { x: x, y: M.top + PH + 26, "text-anchor": "middle", "font-size": 18 }, fmt(t)));
  }

  const yTicks = [];
  if (DATA.log_y) {
    for (let e = Math.round(Math.log10(y0)); e <= Math.round(Math.log10(y1)); e++) yTicks.push(Math.pow(10, e));
  } else {
    yTicks.push(...linearTicks(y0, y1, 6));
  }
  for (const t of yTicks) {
    const y = sy(t);
    grid.appendChild(el("line", { x1: M.left, x2: M.left + PW, y1: y, y2: y }));
    axis.appendChild(el("line", { x1: M.left - 6, x2: M.left, y1: y, y2: y }));
    axis.appendChild(el("text", { x: M.left - 10, y: y + 6, "text-anchor": "end", "font-size": 18 }, fmt(t)));
  }

  axis.appendChild(el("path", { d: `M${M.left},${M.top}V${M.top + PH}H${M.left + PW}`, fill: "none" }));
  svg.appendChild(grid);
  svg.appendChild(axis);

  const lines = el("g", { "clip-path": "url(#plot)" });
  for (const s of DATA.series) {
    if (!s.points.length) continue;
    const pts = s.points.map(p => `${sx(p[0]).toFixed(2)},${sy(p[1]).toFixed(2)}`).join(" ");
    const attrs = { points: pts, fill: "none", stroke: s.color, "stroke-width": 3 };
    if (s.dash) attrs["stroke-dasharray"] = s.dash;
    lines.appendChild(el("polyline", attrs));
  }
  svg.appendChild(lines);

  svg.appendChild(el("text", { x: M.left + PW / 2, y: M.top - 20, "text-anchor": "middle", "font-size": 24 }, DATA.title));

  // Legend (top right, inside the plot area).
  const legend = el("g");
  const rowH = 28, boxW = 170;
  const lx = M.left + PW - boxW - 10, ly = M.top + 10;
  legend.appendChild(el("rect", {
    x: lx, y: ly, width: boxW, height: rowH * DATA.series.length + 10,
    fill: "#fff", stroke: "#bbb", "fill-opacity": 0.9
  }));
  DATA.series.forEach((s, i) => {
    const y = ly + 20 + i * rowH;
    const attrs = { x1: lx + 10, x2: lx + 56, y1: y, y2: y, stroke: s.color, "stroke-width": 3 };
    if (s.dash) attrs["stroke-dasharray"] = s.dash;
    legend.appendChild(el("line", attrs));
    legend.appendChild(el("text", { x: lx + 66, y: y + 7, "font-size": 20 }, s.label));
  });
  if (DATA.series.length) svg.appendChild(legend);

  document.getElementById("chart").appendChild(svg);
}

function renderTable() {
  const body = document.getElementById("seriesBody");
  for (const s of DATA.series) {
    const tr = document.createElement("tr");
    tr.innerHTML = `
      <td><span style="color:${s.color}">&#9644;</span> ${escapeHtml(s.label)}</td>
      <td><code>${escapeHtml(s.dataset)}</code></td>
      <td class="num">${s.samples}</td>
      <td class="num">${s.points.length}</td>
    `;
    body.appendChild(tr);
  }
  if (DATA.x_limit != null) {
    document.getElementById("note").textContent = `x axis limited to [0, ${DATA.x_limit}]`;
  }
}

document.title = `perf: ${DATA.title}`;
renderSummary();
renderChart();
renderTable();
</script>
</body>
</html>
"##;

    Ok(TEMPLATE.replace("__DATA__", &json))
}
