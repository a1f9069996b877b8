//! A library for reading and writing Wavefront .obj files in Rust
//! focused on zero-copy callback operations.
//!
//! The library provides traits for reading and writing .obj files
//! It keeps the 1-based indexing of the .obj format.

use std::fmt::Display;
use std::io;
use std::io::{BufRead, BufReader, Error, ErrorKind};
use std::str::FromStr;

/// Trait for floating point types that can be used in OBJ files.
/// This allows the library to work with both f32 and f64 precision.
pub trait ObjFloat: Copy + Display + FromStr + PartialEq {
    /// Returns the fractional part of the number
    fn fract(self) -> Self;

    /// Returns true if the fractional part is zero
    fn is_zero_fract(self) -> bool {
        self.fract() == Self::zero()
    }

    /// Returns the zero value for this type
    fn zero() -> Self;
}

impl ObjFloat for f32 {
    fn fract(self) -> Self {
        self.fract()
    }
    fn zero() -> Self {
        0.0
    }
}

impl ObjFloat for f64 {
    fn fract(self) -> Self {
        self.fract()
    }
    fn zero() -> Self {
        0.0
    }
}

/// Trait for writing OBJ file data with configurable float precision.
///
/// The generic parameter `F` defaults to `f64` for backward compatibility,
/// but can be set to `f32` for applications that work with single-precision data
/// (like VPX files which use f32 internally).
pub trait ObjWriter<F: ObjFloat = f64> {
    fn write_comment<S: AsRef<str>>(&mut self, comment: S) -> io::Result<()>;
    /// Writes an empty line, used to separate objects visually.
    fn write_blank_line(&mut self) -> io::Result<()>;
    fn write_object_name<S: AsRef<str>>(&mut self, name: S) -> io::Result<()>;
    /// Writes a material library reference (`mtllib <name>`).
    fn write_mtllib<S: AsRef<str>>(&mut self, name: S) -> io::Result<()>;
    /// Writes a material selector (`usemtl <name>`).
    fn write_usemtl<S: AsRef<str>>(&mut self, name: S) -> io::Result<()>;
    fn write_vertex(&mut self, x: F, y: F, z: F, w: Option<F>) -> io::Result<()>;
    fn write_texture_coordinate(&mut self, u: F, v: Option<F>, w: Option<F>) -> io::Result<()>;
    fn write_normal(&mut self, nx: F, ny: F, nz: F) -> io::Result<()>;
    fn write_face(
        &mut self,
        vertex_indices: &[(usize, Option<usize>, Option<usize>)],
    ) -> io::Result<()>;

    /// Writes a face (`f`) line from plain vertex indices, signed so callers
    /// can choose absolute (positive) or relative-to-current-position
    /// (negative) addressing.
    fn write_face_signed(&mut self, vertex_indices: &[isize]) -> io::Result<()>;
    /// Writes a polyline (`l`) line.
    fn write_line(&mut self, vertex_indices: &[isize]) -> io::Result<()>;
    /// Writes a point list (`p`) line.
    fn write_point(&mut self, vertex_indices: &[isize]) -> io::Result<()>;
}

/// Trait for reading OBJ file data with configurable float precision.
///
/// The generic parameter `F` defaults to `f64` for backward compatibility,
/// but can be set to `f32` for applications that work with single-precision data.
pub trait ObjReader<F: ObjFloat = f64> {
    fn read_comment(&mut self, comment: &str) -> ();
    fn read_object_name(&mut self, name: &str) -> ();
    fn read_vertex(&mut self, x: F, y: F, z: F, w: Option<F>) -> ();
    fn read_texture_coordinate(&mut self, u: F, v: Option<F>, w: Option<F>) -> ();
    fn read_normal(&mut self, nx: F, ny: F, nz: F) -> ();
    fn read_face(&mut self, vertex_indices: &[(usize, Option<usize>, Option<usize>)]) -> ();
}

pub fn read_obj_file<R: io::Read, T: ObjReader<F>, F: ObjFloat>(
    reader: R,
    obj_reader: &mut T,
) -> io::Result<()>
where
    <F as FromStr>::Err: std::fmt::Display,
{
    let mut buf_reader = BufReader::new(reader);
    let mut line = String::new();
    let mut lineno: usize = 0;

    while buf_reader.read_line(&mut line)? != 0 {
        lineno += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            line.clear();
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let prefix = parts.next().ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidData,
                format!("line {}: empty prefix", lineno),
            )
        })?;

        let parse_f = |s: &str, kind: &str| -> io::Result<F> {
            s.parse::<F>().map_err(|e| {
                Error::new(
                    ErrorKind::InvalidData,
                    format!("line {}: invalid {} float: {} ({})", lineno, kind, s, e),
                )
            })
        };

        let parse_index = |s: &str, kind: &str| -> io::Result<usize> {
            let index = s.parse::<usize>().map_err(|_| {
                Error::new(
                    ErrorKind::InvalidData,
                    format!("line {}: invalid {} index: {}", lineno, kind, s),
                )
            })?;
            if index == 0 {
                return Err(Error::new(
                    ErrorKind::InvalidData,
                    format!("line {}: {} index must be positive: {}", lineno, kind, s),
                ));
            }
            Ok(index)
        };

        match prefix {
            "#" => {
                let comment = parts.collect::<Vec<&str>>().join(" ");
                obj_reader.read_comment(&comment);
            }
            "v" => {
                let x = parts
                    .next()
                    .ok_or_else(|| {
                        Error::new(
                            ErrorKind::InvalidData,
                            format!("line {}: missing vertex x", lineno),
                        )
                    })
                    .and_then(|s| parse_f(s, "vertex x"))?;
                let y = parts
                    .next()
                    .ok_or_else(|| {
                        Error::new(
                            ErrorKind::InvalidData,
                            format!("line {}: missing vertex y", lineno),
                        )
                    })
                    .and_then(|s| parse_f(s, "vertex y"))?;
                let z = parts
                    .next()
                    .ok_or_else(|| {
                        Error::new(
                            ErrorKind::InvalidData,
                            format!("line {}: missing vertex z", lineno),
                        )
                    })
                    .and_then(|s| parse_f(s, "vertex z"))?;
                let w = match parts.next() {
                    Some(s) => Some(s.parse::<F>().map_err(|e| {
                        Error::new(
                            ErrorKind::InvalidData,
                            format!("line {}: invalid vertex w float: {} ({})", lineno, s, e),
                        )
                    })?),
                    None => None,
                };
                obj_reader.read_vertex(x, y, z, w);
            }
            "vt" => {
                let u = parts
                    .next()
                    .ok_or_else(|| {
                        Error::new(
                            ErrorKind::InvalidData,
                            format!("line {}: missing texture u", lineno),
                        )
                    })
                    .and_then(|s| parse_f(s, "texture u"))?;
                let v = match parts.next() {
                    Some(s) => Some(s.parse::<F>().map_err(|e| {
                        Error::new(
                            ErrorKind::InvalidData,
                            format!("line {}: invalid texture v float: {} ({})", lineno, s, e),
                        )
                    })?),
                    None => None,
                };
                let w = match parts.next() {
                    Some(s) => Some(s.parse::<F>().map_err(|e| {
                        Error::new(
                            ErrorKind::InvalidData,
                            format!("line {}: invalid texture w float: {} ({})", lineno, s, e),
                        )
                    })?),
                    None => None,
                };
                obj_reader.read_texture_coordinate(u, v, w);
            }
            "vn" => {
                let nx = parts
                    .next()
                    .ok_or_else(|| {
                        Error::new(
                            ErrorKind::InvalidData,
                            format!("line {}: missing normal nx", lineno),
                        )
                    })
                    .and_then(|s| parse_f(s, "normal nx"))?;
                let ny = parts
                    .next()
                    .ok_or_else(|| {
                        Error::new(
                            ErrorKind::InvalidData,
                            format!("line {}: missing normal ny", lineno),
                        )
                    })
                    .and_then(|s| parse_f(s, "normal ny"))?;
                let nz = parts
                    .next()
                    .ok_or_else(|| {
                        Error::new(
                            ErrorKind::InvalidData,
                            format!("line {}: missing normal nz", lineno),
                        )
                    })
                    .and_then(|s| parse_f(s, "normal nz"))?;
                obj_reader.read_normal(nx, ny, nz);
            }
            "f" => {
                let mut vertex_indices = Vec::new();
                for part in parts {
                    // parse "v[/vt[/vn]]" by slicing without allocating
                    let first_slash = part.find('/');
                    let (v_str, rest) = match first_slash {
                        Some(i) => (&part[..i], &part[i + 1..]),
                        None => (part, ""),
                    };

                    let v_idx = parse_index(v_str, "vertex")?;

                    let (vt_idx, vn_idx) = if rest.is_empty() {
                        (None, None)
                    } else {
                        let second_slash = rest.find('/');
                        if let Some(j) = second_slash {
                            let vt_part = &rest[..j];
                            let vn_part = &rest[j + 1..];
                            let vt = if vt_part.is_empty() {
                                None
                            } else {
                                Some(parse_index(vt_part, "texcoord")?)
                            };
                            let vn = if vn_part.is_empty() {
                                None
                            } else {
                                Some(parse_index(vn_part, "normal")?)
                            };
                            (vt, vn)
                        } else {
                            // only vt present
                            let vt = if rest.is_empty() {
                                None
                            } else {
                                Some(parse_index(rest, "texcoord")?)
                            };
                            (vt, None)
                        }
                    };

                    vertex_indices.push((v_idx, vt_idx, vn_idx));
                }
                obj_reader.read_face(&vertex_indices);
            }
            "o" => {
                let name = parts.collect::<Vec<&str>>().join(" ");
                obj_reader.read_object_name(&name);
            }
            other => {
                return Err(Error::new(
                    ErrorKind::InvalidData,
                    format!("line {}: Unknown line prefix: {}", lineno, other),
                ));
            }
        }

        line.clear();
    }

    Ok(())
}

pub struct IoObjWriter<W: io::Write, F: ObjFloat = f64> {
    out: W,
    line_buf: Vec<u8>,
    /// When true, use VPinball-compatible formatting (6 decimal places like fprintf %f)
    vpinball_compat: bool,
    _phantom: std::marker::PhantomData<F>,
}
impl<W: io::Write, F: ObjFloat> IoObjWriter<W, F> {
    /// Creates a new OBJ writer with default formatting (full precision)
    pub fn new(writer: W) -> Self {
        IoObjWriter {
            out: writer,
            line_buf: Vec::with_capacity(256),
            vpinball_compat: false,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Creates a new OBJ writer with VPinball-compatible formatting.
    /// This uses 6 decimal places (like fprintf %f) to match VPinball's OBJ export format.
    pub fn new_vpinball_compat(writer: W) -> Self {
        IoObjWriter {
            out: writer,
            line_buf: Vec::with_capacity(256),
            vpinball_compat: true,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Sets VPinball-compatible formatting mode.
    /// When true, floats are formatted with 6 decimal places to match VPinball's fprintf %f.
    pub fn set_vpinball_compat(&mut self, compat: bool) {
        self.vpinball_compat = compat;
    }

    /// Consumes the writer, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    #[inline]
    fn push_str(&mut self, s: &str) {
        self.line_buf.extend_from_slice(s.as_bytes());
    }

    #[inline]
    fn push_u<T: itoa::Integer>(&mut self, v: T) {
        let mut buf = itoa::Buffer::new();
        self.push_str(buf.format(v));
    }

    #[inline]
    fn push_f(&mut self, v: F) {
        // we want 0 as "0" not "0.0"
        if v.is_zero_fract() {
            self.push_str(&format!("{}", v));
            return;
        }
        // Use VPinball-compatible formatting (6 decimal places like fprintf %f) if enabled,
        // otherwise use full precision
        if self.vpinball_compat {
            self.push_str(&format!("{:.6}", v));
        } else {
            self.push_str(&format!("{}", v));
        }
    }

    #[inline]
    fn flush_line(&mut self) -> io::Result<()> {
        self.line_buf.push(b'\n');
        self.out.write_all(&self.line_buf)?;
        self.line_buf.clear();
        Ok(())
    }
}
impl<W: io::Write, F: ObjFloat> ObjWriter<F> for IoObjWriter<W, F> {
    fn write_comment<S: AsRef<str>>(&mut self, comment: S) -> io::Result<()> {
        self.push_str("# ");
        self.push_str(comment.as_ref());
        self.flush_line()
    }

    fn write_blank_line(&mut self) -> io::Result<()> {
        self.flush_line()
    }

    fn write_object_name<S: AsRef<str>>(&mut self, name: S) -> io::Result<()> {
        self.push_str("o ");
        self.push_str(name.as_ref());
        self.flush_line()
    }

    fn write_mtllib<S: AsRef<str>>(&mut self, name: S) -> io::Result<()> {
        self.push_str("mtllib ");
        self.push_str(name.as_ref());
        self.flush_line()
    }

    fn write_usemtl<S: AsRef<str>>(&mut self, name: S) -> io::Result<()> {
        self.push_str("usemtl ");
        self.push_str(name.as_ref());
        self.flush_line()
    }

    fn write_vertex(&mut self, x: F, y: F, z: F, w: Option<F>) -> io::Result<()> {
        self.push_str("v ");
        self.push_f(x);
        self.push_str(" ");
        self.push_f(y);
        self.push_str(" ");
        self.push_f(z);
        if let Some(wv) = w {
            self.push_str(" ");
            self.push_f(wv);
        }
        self.flush_line()
    }

    fn write_texture_coordinate(&mut self, u: F, v: Option<F>, w: Option<F>) -> io::Result<()> {
        self.push_str("vt ");
        self.push_f(u);
        if let Some(vv) = v {
            self.push_str(" ");
            self.push_f(vv);
            if let Some(wv) = w {
                self.push_str(" ");
                self.push_f(wv);
            }
        }
        self.flush_line()
    }

    fn write_normal(&mut self, nx: F, ny: F, nz: F) -> io::Result<()> {
        self.push_str("vn ");
        self.push_f(nx);
        self.push_str(" ");
        self.push_f(ny);
        self.push_str(" ");
        self.push_f(nz);
        self.flush_line()
    }

    fn write_face(
        &mut self,
        vertex_indices: &[(usize, Option<usize>, Option<usize>)],
    ) -> io::Result<()> {
        // Build the whole face line and write once.
        self.push_str("f");
        for (v_idx, vt_idx, vn_idx) in vertex_indices.iter() {
            self.push_str(" ");
            // If your internal indices are zero-based, emit +1 here:
            self.push_u(*v_idx);
            match (vt_idx, vn_idx) {
                (None, None) => {}
                (Some(vt), None) => {
                    self.push_str("/");
                    self.push_u(*vt);
                }
                (None, Some(vn)) => {
                    self.push_str("//");
                    self.push_u(*vn);
                }
                (Some(vt), Some(vn)) => {
                    self.push_str("/");
                    self.push_u(*vt);
                    self.push_str("/");
                    self.push_u(*vn);
                }
            }
        }
        self.flush_line()
    }

    fn write_face_signed(&mut self, vertex_indices: &[isize]) -> io::Result<()> {
        self.push_str("f");
        for idx in vertex_indices {
            self.push_str(" ");
            self.push_u(*idx);
        }
        self.flush_line()
    }

    fn write_line(&mut self, vertex_indices: &[isize]) -> io::Result<()> {
        self.push_str("l");
        for idx in vertex_indices {
            self.push_str(" ");
            self.push_u(*idx);
        }
        self.flush_line()
    }

    fn write_point(&mut self, vertex_indices: &[isize]) -> io::Result<()> {
        self.push_str("p");
        for idx in vertex_indices {
            self.push_str(" ");
            self.push_u(*idx);
        }
        self.flush_line()
    }
}
