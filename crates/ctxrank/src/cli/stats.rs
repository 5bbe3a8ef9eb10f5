use anyhow::Result;
use ctxrank_core::{Pipeline, StatsKind};

use super::{read_articles, StatsArgs};

pub fn run(args: &StatsArgs) -> Result<()> {
    let config = args.pipeline.resolve()?;
    let articles = read_articles(&args.corpus)?;

    let mut pipeline = Pipeline::new(config)?;
    pipeline.run(articles);

    let kinds = args.kind.map_or_else(|| StatsKind::ALL.to_vec(), |k| vec![k]);
    for kind in kinds {
        print!("{}", kind.compute(pipeline.corpus()));
    }

    Ok(())
}
