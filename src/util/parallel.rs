use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

/// Maps `func` over `items`, on a dedicated pool of `jobs` threads when more
/// than one is requested. Output order matches input order.
pub fn run_in_parallel<T, R, F>(items: Vec<T>, jobs: Option<usize>, func: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Send + Sync,
{
    match jobs {
        Some(count) if count > 1 => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(count).build();
            if let Ok(pool) = pool {
                return pool.install(|| items.into_par_iter().map(func).collect());
            }
            items.into_iter().map(func).collect()
        }
        _ => items.into_iter().map(func).collect(),
    }
}

/// Same as [`run_in_parallel`], ticking a progress bar as each item finishes.
pub fn run_with_progress<T, R, F>(
    items: Vec<T>,
    jobs: Option<usize>,
    hidden: bool,
    func: F,
) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Send + Sync,
{
    let progress = if hidden {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(items.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}") {
            bar.set_style(style);
        }
        bar
    };

    let results = run_in_parallel(items, jobs, |item| {
        let result = func(item);
        progress.inc(1);
        result
    });
    progress.finish_and_clear();
    results
}
