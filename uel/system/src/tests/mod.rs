/// Handler counting its invocations.
macro_rules! bump {
    ($count:expr) => {{
        let count: &::core::cell::Cell<u32> = $count;
        $crate::handler(move |_, _| {
            count.set(count.get() + 1);
            $crate::Value::None
        })
    }};
}

/// Handler appending a tag to a shared trace.
macro_rules! record {
    ($trace:expr, $tag:expr) => {{
        let trace: &::core::cell::RefCell<::std::vec::Vec<&'static str>> = $trace;
        let tag: &'static str = $tag;
        $crate::handler(move |_, _| {
            trace.borrow_mut().push(tag);
            $crate::Value::None
        })
    }};
}

/// Destructor counting how many closures were destroyed.
macro_rules! on_destroy {
    ($count:expr) => {{
        let count: &::core::cell::Cell<u32> = $count;
        move |_: &$crate::Closure<'_>| count.set(count.get() + 1)
    }};
}

mod scheduler;
mod signal;
