// src/api/index.rs — Embedded single-page UI
//
// Served from "/" so the binary is self-contained: plot the preview curve,
// start and stop runs, follow iterations over SSE, download the CSV.

pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>minseek</title>
<style>
*{margin:0;padding:0;box-sizing:border-box}
body{background:#0d1117;color:#c9d1d9;font-family:'Cascadia Code','Fira Code',monospace;min-height:100vh;display:flex;flex-direction:column}
header{padding:14px 24px;border-bottom:1px solid #21262d;display:flex;align-items:baseline;gap:12px}
header h1{font-size:1.2rem;color:#58a6ff}
header span{font-size:.75rem;color:#8b949e}
.controls{display:flex;gap:10px;padding:12px 24px;flex-wrap:wrap;align-items:end;border-bottom:1px solid #21262d;background:#161b22}
.field{display:flex;flex-direction:column;gap:3px}
.field label{font-size:.7rem;color:#8b949e;text-transform:uppercase;letter-spacing:.5px}
.field input{background:#0d1117;border:1px solid #30363d;color:#c9d1d9;padding:6px 10px;border-radius:6px;font-family:inherit;font-size:.85rem;width:90px}
.field input:focus{outline:none;border-color:#58a6ff}
.field input#expr{width:260px}
.btn{border:none;padding:6px 14px;border-radius:6px;font-family:inherit;font-size:.85rem;cursor:pointer;color:#fff}
.btn-go{background:#238636}.btn-go:hover{background:#2ea043}
.btn-stop{background:#da3633}.btn-stop:hover{background:#f85149}
.btn:disabled{background:#21262d;color:#484f58;cursor:not-allowed}
a.export{font-size:.8rem;color:#8957e5;align-self:center}
#status{padding:8px 24px;font-size:.85rem;color:#8b949e;min-height:2em}
#status .ok{color:#3fb950}#status .err{color:#f85149}
main{display:flex;flex:1;gap:16px;padding:16px 24px;flex-wrap:wrap}
canvas{background:#161b22;border:1px solid #21262d;border-radius:6px}
table{border-collapse:collapse;font-size:.78rem;height:fit-content}
th,td{padding:3px 10px;text-align:right;border-bottom:1px solid #21262d}
th{color:#8b949e;font-weight:normal}
</style>
</head>
<body>
<header><h1>minseek</h1><span>one-dimensional minimization, live</span></header>
<div class="controls">
  <div class="field"><label for="expr">f(x)</label><input id="expr" value="x^2 + sin(3*x)"></div>
  <div class="field"><label for="a">a</label><input id="a" value="-2"></div>
  <div class="field"><label for="b">b</label><input id="b" value="2"></div>
  <div class="field"><label for="eps">eps</label><input id="eps" placeholder="1e-5"></div>
  <div class="field"><label for="maxIter">max iter</label><input id="maxIter" placeholder="200"></div>
  <button id="start" class="btn btn-go">Start</button>
  <button id="stop" class="btn btn-stop" disabled>Stop</button>
  <a id="export" class="export" hidden>CSV</a>
</div>
<div id="status">idle</div>
<main>
  <canvas id="plot" width="640" height="420"></canvas>
  <table><thead><tr><th>k</th><th>a</th><th>b</th><th>x mid</th><th>f(x mid)</th><th>b-a</th></tr></thead>
  <tbody id="rows"></tbody></table>
</main>
<script>
"use strict";
const $ = id => document.getElementById(id);
const ctx = $("plot").getContext("2d");
let es = null, runId = null, curve = null, marker = null;

function setStatus(html) { $("status").innerHTML = html; }
function fmt(v) { return Number(v).toPrecision(6); }

function draw() {
  const W = $("plot").width, H = $("plot").height, pad = 36;
  ctx.clearRect(0, 0, W, H);
  if (!curve) return;
  const xs = curve.xs, ys = curve.ys;
  const fin = ys.filter(y => y !== null && isFinite(y));
  if (!fin.length) return;
  let ymin = Math.min(...fin), ymax = Math.max(...fin);
  if (ymin === ymax) { ymin -= 1; ymax += 1; }
  const x0 = xs[0], x1 = xs[xs.length - 1];
  const px = x => pad + (x - x0) / (x1 - x0) * (W - 2 * pad);
  const py = y => H - pad - (y - ymin) / (ymax - ymin) * (H - 2 * pad);
  ctx.strokeStyle = "#30363d";
  ctx.strokeRect(pad, pad, W - 2 * pad, H - 2 * pad);
  ctx.strokeStyle = "#58a6ff";
  ctx.beginPath();
  let pen = false;
  for (let i = 0; i < xs.length; i++) {
    const y = ys[i];
    if (y === null || !isFinite(y)) { pen = false; continue; }
    if (pen) ctx.lineTo(px(xs[i]), py(y)); else ctx.moveTo(px(xs[i]), py(y));
    pen = true;
  }
  ctx.stroke();
  if (marker) {
    ctx.fillStyle = "#f85149";
    ctx.beginPath();
    ctx.arc(px(marker[0]), py(Math.max(ymin, Math.min(ymax, marker[1]))), 4, 0, 7);
    ctx.fill();
  }
}

function addRow(it) {
  const tr = document.createElement("tr");
  tr.innerHTML = `<td>${it.k}</td><td>${fmt(it.a)}</td><td>${fmt(it.b)}</td>` +
                 `<td>${fmt(it.xMid)}</td><td>${fmt(it.fxMid)}</td><td>${fmt(it.len)}</td>`;
  $("rows").prepend(tr);
}

function finish(text, cls) {
  setStatus(`<span class="${cls}">${text}</span>`);
  if (es) { es.close(); es = null; }
  $("start").disabled = false;
  $("stop").disabled = true;
}

function follow(id) {
  es = new EventSource(`/api/v1/runs/${id}/events`);
  es.onmessage = e => {
    const ev = JSON.parse(e.data);
    if (ev.type === "iteration") {
      addRow(ev.iter);
      marker = [ev.iter.xMid, ev.iter.fxMid];
      draw();
      setStatus(`k=${ev.iter.k} &nbsp; interval ${fmt(ev.iter.len)}`);
    } else if (ev.type === "done") {
      marker = [ev.x, ev.fx];
      draw();
      finish(`minimum near x = ${fmt(ev.x)}, f = ${fmt(ev.fx)}`, "ok");
    } else if (ev.type === "error") {
      finish(`failed: ${ev.message}`, "err");
    } else if (ev.type === "stopped") {
      finish("stopped", "ok");
    }
  };
  es.onerror = () => { if (es) finish("connection lost", "err"); };
}

$("start").onclick = async () => {
  const body = { expr: $("expr").value, a: parseFloat($("a").value), b: parseFloat($("b").value) };
  if ($("eps").value) body.eps = parseFloat($("eps").value);
  if ($("maxIter").value) body.maxIter = parseInt($("maxIter").value, 10);
  $("rows").innerHTML = "";
  marker = null;
  const resp = await fetch("/api/v1/runs", {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify(body),
  });
  const data = await resp.json();
  if (!resp.ok) { setStatus(`<span class="err">${data.error}</span>`); return; }
  runId = data.id;
  curve = data.curve;
  draw();
  $("start").disabled = true;
  $("stop").disabled = false;
  $("export").hidden = false;
  $("export").href = `/api/v1/runs/${runId}/export`;
  setStatus("running " + runId);
  follow(runId);
};

$("stop").onclick = () => { if (runId) fetch(`/api/v1/runs/${runId}/stop`, { method: "POST" }); };
</script>
</body>
</html>
"##;
