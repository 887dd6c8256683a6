// callable_journal_macro/src/lib.rs
extern crate proc_macro;
use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Error, FnArg, Ident, ItemFn, LitStr, Pat, ReturnType, Token, Type, ext::IdentExt,
    parse::Parse, punctuated::Punctuated, spanned::Spanned,
};

// Right-hand side of a single `key = value` option
enum OptionValue {
    Str(LitStr),
    List(Vec<ListItem>),
    All(Token![*]),
}

enum ListItem {
    Str(LitStr),
    Ignore(Token![_]),
}

impl Parse for ListItem {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        if input.peek(Token![_]) {
            return Ok(ListItem::Ignore(input.parse()?));
        }
        Ok(ListItem::Str(input.parse()?))
    }
}

struct JournalOption {
    key: Ident,
    value: OptionValue,
}

impl Parse for JournalOption {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let key = input.call(Ident::parse_any)?;
        input.parse::<Token![=]>()?;

        let value = if input.peek(LitStr) {
            OptionValue::Str(input.parse()?)
        } else if input.peek(Token![*]) {
            OptionValue::All(input.parse()?)
        } else if input.peek(syn::token::Bracket) {
            let content;
            syn::bracketed!(content in input);
            let items = Punctuated::<ListItem, Token![,]>::parse_terminated(&content)?;
            OptionValue::List(items.into_iter().collect())
        } else {
            return Err(input.error("expected a string literal, a list of string literals or `*`"));
        };

        Ok(JournalOption { key, value })
    }
}

enum CopyChoice {
    All,
    Names(Vec<LitStr>),
}

// Parsed attribute arguments
#[derive(Default)]
struct JournalOptions {
    objective: Option<LitStr>,
    result_names: Option<Vec<ListItem>>,
    copy_args: Option<CopyChoice>,
    drop_args: Option<Vec<LitStr>>,
}

impl Parse for JournalOptions {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut options = JournalOptions::default();
        let parsed = Punctuated::<JournalOption, Token![,]>::parse_terminated(input)?;

        for JournalOption { key, value } in parsed {
            match key.to_string().as_str() {
                "objective" => {
                    let OptionValue::Str(lit) = value else {
                        return Err(Error::new(key.span(), "objective must be a string literal"));
                    };
                    set_once(&mut options.objective, lit, &key)?;
                }
                "result_names" => {
                    let items = match value {
                        OptionValue::Str(lit) => vec![ListItem::Str(lit)],
                        OptionValue::List(items) => items,
                        OptionValue::All(star) => {
                            return Err(create_error(
                                star.span(),
                                "`*` is not valid for result_names",
                                Some("Use `_` to leave a result out"),
                            ));
                        }
                    };
                    set_once(&mut options.result_names, items, &key)?;
                }
                "copy_args" => {
                    let choice = match value {
                        OptionValue::All(_) => CopyChoice::All,
                        OptionValue::Str(lit) => CopyChoice::Names(vec![lit]),
                        OptionValue::List(items) => CopyChoice::Names(names_only(items)?),
                    };
                    set_once(&mut options.copy_args, choice, &key)?;
                }
                "drop_args" => {
                    let names = match value {
                        OptionValue::Str(lit) => vec![lit],
                        OptionValue::List(items) => names_only(items)?,
                        OptionValue::All(star) => {
                            return Err(Error::new(star.span(), "`*` is not valid for drop_args"));
                        }
                    };
                    set_once(&mut options.drop_args, names, &key)?;
                }
                other => {
                    return Err(create_error(
                        key.span(),
                        &format!("Unknown journal option `{}`", other),
                        Some("Expected one of: objective, result_names, copy_args, drop_args"),
                    ));
                }
            }
        }

        Ok(options)
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, key: &Ident) -> syn::Result<()> {
    if slot.is_some() {
        return Err(Error::new(key.span(), format!("Duplicate journal option `{}`", key)));
    }
    *slot = Some(value);
    Ok(())
}

fn names_only(items: Vec<ListItem>) -> syn::Result<Vec<LitStr>> {
    items
        .into_iter()
        .map(|item| match item {
            ListItem::Str(lit) => Ok(lit),
            ListItem::Ignore(underscore) => Err(Error::new(
                underscore.span(),
                "`_` is only valid in result_names",
            )),
        })
        .collect()
}

// Helper function to create decorated error messages
fn create_error(span: proc_macro2::Span, message: &str, help: Option<&str>) -> Error {
    let mut err = Error::new(span, message);
    if let Some(help_msg) = help {
        err.combine(Error::new(span, help_msg));
    }
    err
}

fn returns_result(output: &ReturnType) -> bool {
    match output {
        ReturnType::Type(_, ty) => matches!(
            &**ty,
            Type::Path(type_path)
                if type_path.path.segments.last().is_some_and(|segment| segment.ident == "Result")
        ),
        ReturnType::Default => false,
    }
}

/// Journals every call of the decorated function.
///
/// Each call emits one record holding the objective, the process-wide
/// context, the bound arguments and either the results or the failure.
/// Arguments are captured through `callable_journal::ToDatum` before the
/// body runs; the body itself receives the original arguments untouched.
///
/// # Arguments
///
/// * `objective = "..."` - Record label, defaults to the function name
/// * `result_names = "x"` or `["x", _]` - Positional result names, `_` skips one
/// * `copy_args = "a"`, `["a", "b"]` or `*` - Arguments snapshotted before the call
/// * `drop_args = "a"` or `["a", "b"]` - Arguments left out of the record
///
/// # Examples
///
/// Basic usage:
/// ```rust,ignore
/// use callable_journal::journal;
///
/// #[journal]
/// fn add(x: i32, y: i32) -> i32 {
///     x + y
/// }
/// ```
///
/// Named results, one of them left out:
/// ```rust,ignore
/// use callable_journal::journal;
///
/// #[journal(objective = "split", result_names = ["head", _])]
/// fn split(values: Vec<i32>) -> (i32, Vec<i32>) {
///     (values[0], values[1..].to_vec())
/// }
/// ```
///
/// Result-returning functions journal `Err` values as exceptions:
/// ```rust,ignore
/// use callable_journal::journal;
///
/// #[journal(drop_args = "password")]
/// fn login(user: &str, password: &str) -> Result<u64, AuthError> {
///     authenticate(user, password)
/// }
/// ```
///
/// Using with struct methods (the receiver is never journaled):
/// ```rust,ignore
/// use callable_journal::journal;
///
/// struct Counter {
///     value: i32,
/// }
///
/// impl Counter {
///     #[journal(result_names = "value")]
///     pub fn increment(&mut self, by: i32) -> i32 {
///         self.value += by;
///         self.value
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn journal(attr: TokenStream, item: TokenStream) -> TokenStream {
    let options = match syn::parse::<JournalOptions>(attr) {
        Ok(options) => options,
        Err(e) => return TokenStream::from(e.to_compile_error()),
    };

    let input_fn = match syn::parse::<ItemFn>(item) {
        Ok(f) => f,
        Err(e) => return TokenStream::from(e.to_compile_error()),
    };

    // Validate function signature
    if input_fn.sig.constness.is_some() {
        return TokenStream::from(
            create_error(
                input_fn.sig.constness.span(),
                "Cannot journal const functions",
                Some("The journal attribute cannot be used with const functions"),
            )
            .to_compile_error(),
        );
    }
    if input_fn.sig.asyncness.is_some() {
        return TokenStream::from(
            create_error(
                input_fn.sig.asyncness.span(),
                "Cannot journal async functions",
                Some("Journal the synchronous function the async code calls instead"),
            )
            .to_compile_error(),
        );
    }

    let drop_names: Vec<String> = options
        .drop_args
        .iter()
        .flatten()
        .map(LitStr::value)
        .collect();

    // Declared parameter names and the captured value for each
    let mut param_names = Vec::new();
    let mut captures = Vec::new();
    for input in &input_fn.sig.inputs {
        match input {
            FnArg::Receiver(_) => {
                param_names.push("self".to_string());
                captures.push(quote!(::callable_journal::Datum::opaque_of(&self)));
            }
            FnArg::Typed(pat_type) => {
                let Pat::Ident(pat_ident) = &*pat_type.pat else {
                    return TokenStream::from(
                        create_error(
                            pat_type.pat.span(),
                            "Journaled parameters must be plain identifiers",
                            Some("Destructure the parameter inside the function body"),
                        )
                        .to_compile_error(),
                    );
                };
                let ident = &pat_ident.ident;
                let name = ident.unraw().to_string();
                if drop_names.contains(&name) {
                    captures.push(quote!(::callable_journal::Datum::opaque_of(&#ident)));
                } else {
                    captures.push(quote!(::callable_journal::ToDatum::to_datum(&#ident)));
                }
                param_names.push(name);
            }
        }
    }

    let fn_name = input_fn.sig.ident.unraw().to_string();

    // Copy and drop selections must name declared parameters
    let selected = options
        .drop_args
        .iter()
        .flatten()
        .chain(match &options.copy_args {
            Some(CopyChoice::Names(names)) => names.as_slice(),
            _ => &[],
        });
    for name in selected {
        if !param_names.contains(&name.value()) {
            return TokenStream::from(
                Error::new(
                    name.span(),
                    format!("`{}` is not a parameter of `{}`", name.value(), fn_name),
                )
                .to_compile_error(),
            );
        }
    }

    let objective = options
        .objective
        .as_ref()
        .map(LitStr::value)
        .unwrap_or_else(|| fn_name.clone());

    let result_names = options.result_names.as_ref().map(|items| {
        let names = items.iter().map(|item| match item {
            ListItem::Str(lit) => quote!(::callable_journal::ResultName::from(#lit)),
            ListItem::Ignore(_) => quote!(::callable_journal::IGNORE),
        });
        quote!(.result_names(::std::vec![#(#names),*]))
    });

    let copy_args = options.copy_args.as_ref().map(|choice| match choice {
        CopyChoice::All => quote!(.copy_args(::callable_journal::COPY_ALL)),
        CopyChoice::Names(names) => quote! {
            .copy_args(::callable_journal::CopyArgs::Names(
                ::std::vec![#(::std::string::String::from(#names)),*]
            ))
        },
    });

    let drop_args = options
        .drop_args
        .as_ref()
        .filter(|names| !names.is_empty())
        .map(|names| quote!(.drop_args([#(#names),*])));

    let invoke = if returns_result(&input_fn.sig.output) {
        quote!(try_call)
    } else {
        quote!(call)
    };

    let attrs = &input_fn.attrs;
    let vis = &input_fn.vis;
    let sig = &input_fn.sig;
    let body = &input_fn.block;

    // The configuration names no generic parameter, so one per thread
    // serves every call and every instantiation.
    let output = quote! {
        #(#attrs)*
        #vis #sig {
            ::std::thread_local! {
                static __JOURNAL: ::callable_journal::Journal = ::callable_journal::Journal::new(
                    ::callable_journal::Signature::new(#fn_name) #(.param(#param_names))*
                )
                .objective(#objective)
                #result_names
                #copy_args
                #drop_args;
            }
            let __journal_call = ::callable_journal::Call::new() #(.arg(#captures))*;
            __JOURNAL.with(|__journal| {
                __journal.#invoke(::callable_journal::global(), __journal_call, || #body)
            })
        }
    };

    output.into()
}
