//! Template compiler for the Zeno view layer.
//!
//! Source text goes through four stages:
//!
//! 1. [`lexer`]: a flat token stream of text, echoes, directives and
//!    component tags
//! 2. [`parser`]: a [`Node`] tree; parsing never fails
//! 3. [`codegen`]: a [`Routine`] of ops with every expression pre-parsed
//! 4. [`Routine::render`]: interpretation against a [`Scope`] and a
//!    [`RenderHost`]
//!
//! ## Example
//!
//! ```ignore
//! use zeno_template::compile;
//!
//! let routine = compile("@foreach(items as item)<li>{{ item }}</li>@endforeach")?;
//! let html = routine.render(&scope, &host)?;
//! ```
//!
//! ## Directives
//!
//! | Directive | Output |
//! |-----------|--------|
//! | `@if` / `@elseif` / `@else`, `@unless`, `@isset`, `@empty` | conditional blocks |
//! | `@switch` / `@case` / `@default` / `@break` | fallthrough switch |
//! | `@foreach(list as [key =>] item)` | loop with a `loop` record |
//! | `@json`, `@class`, `@style` | JSON, `class="..."`, `style="..."` |
//! | `@checked`, `@selected`, `@disabled`, `@readonly`, `@required` | bare attribute |
//! | `@click(handler)`, `@model(path)` | event binding markers |
//! | `@extends`, `@section`, `@yield` | layouts |
//! | `@push` / `@stack` | named stacks |
//! | `@include`, `@inject`, `@component` | nested views, services, components |

pub mod args;
pub mod ast;
pub mod codegen;
pub mod expr;
pub mod helpers;
pub mod lexer;
pub mod markup;
pub mod parser;
pub mod routine;

pub use ast::Node;
pub use codegen::{CompileError, compile, generate};
pub use lexer::{Lexer, Token, tokenize};
pub use markup::{Diagnostic, DiagnosticKind, Rendered};
pub use parser::{is_block_directive, parse};
pub use routine::{Fragment, RenderError, RenderHost, Routine, Scope, SlotMap};

/// Result type for template compilation
pub type TemplateResult<T> = Result<T, CompileError>;
