//! Small pages in the shape of real encyclopedia entries.

/// An entry with a preamble, numbered sections, inline and script math, a
/// table, one footnote, a bibliography inside the main text, the usual
/// trailing sections and one appendix link.
pub const ARTICLE_HTML: &str = r##"<!DOCTYPE html>
<html>
<head><title>Test (Stanford Encyclopedia of Philosophy)</title></head>
<body>
<div id="article">
<div id="article-content">
<div id="aueditable">
<h1>Test</h1>
<div id="pubinfo"><em>First published Tue Jun 18, 2004; substantive revision Mon Mar 4, 2024</em></div>

<div id="preamble">
<p>Test is a topic in <em>philosophy</em>.</p>
</div>

<div id="main-text">
<h2 id="Over">1. Overview</h2>
<p>See <a href="https://x">text</a>.<sup>[<a href="notes.html#note-1" id="ref-1">1</a>]</sup></p>
<p>Let \(p \to q\) and <script type="math/tex">\R^2</script> be given.</p>

<h3 id="Deta">1.1 Details</h3>
<ul>
<li>First point</li>
<li>Second <em>point</em></li>
</ul>
<blockquote><p>Quoted text.</p></blockquote>
<table>
<tr><th>Term</th><th>Gloss</th></tr>
<tr><td>p</td><td>a proposition</td></tr>
</table>

<h2 id="Bib">Bibliography</h2>
<ul class="hanging">
<li>Smith, J., 2020, <em>A Book</em>, Publisher.</li>
</ul>

<h2 id="Aca">Academic Tools</h2>
<p>Cite this entry.</p>

<h2 id="Oth">Other Internet Resources</h2>
<ul><li><a href="https://example.org/">Elsewhere</a></li></ul>

<h2 id="Rel">Related Entries</h2>
<p><a href="../other/">other</a></p>

<h2>Appendices</h2>
<ul>
<li><a href="appendix.html">A. Proofs</a></li>
</ul>
</div>

<div id="footnotes">
<h3>Notes to Test</h3>
<p id="note-1"><a href="index.html#ref-1">1.</a> A note with <em>emphasis</em>.</p>
</div>
</div>
</div>

<div id="article-copyright">
<p>Copyright &copy; 2024 by <br />
<a href="../../info.html#c">Jane Doe</a>
&lt;<em>jane&#64;example.org</em>&gt;</p>
</div>
</div>
</body>
</html>
"##;

/// The page behind the appendix link in [`ARTICLE_HTML`].
pub const APPENDIX_HTML: &str = r#"<!DOCTYPE html>
<html><body>
<div id="aueditable">
<div id="main-text">
<h2>Appendix A: Proofs</h2>
<p>Proof of the <em>lemma</em>.</p>
<h3>Step 1</h3>
<p>Trivial.</p>
</div>
</div>
</body></html>
"#;

/// A MathJax configuration script declaring one plain and one argument macro.
pub const MACROS_JS: &str = r#"MathJax.Hub.Config({
  TeX: {
    Macros: {
      R: "{\\mathbb R}",
      pair: ["\\langle #1, #2 \\rangle", 2]
    }
  }
});
"#;

/// A table-of-contents page with relative, absolute and duplicate entry links.
pub const CONTENTS_HTML: &str = r#"<html><body>
<ul>
<li><a href="entries/abduction/">abduction</a></li>
<li><a href="entries/kant">Kant, Immanuel</a></li>
<li><a href="https://plato.stanford.edu/entries/abduction/#Dia">abduction (dialectic)</a></li>
<li><a href="/entries/zeno-elea/">Zeno of Elea</a></li>
<li><a href="info.html">About</a></li>
</ul>
</body></html>
"#;
