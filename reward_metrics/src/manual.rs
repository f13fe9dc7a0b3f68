/*!

This is the long-form manual for `reward_metrics` and `top_performers`.

## Input format

The input is an Excel workbook (.xlsx). Each worksheet is one period of the leaderboard,
for example one month. The first row of a worksheet is the header, and it must contain the
following columns (in any order, other columns are ignored):

* `#` the rank in the original leaderboard (not used)
* `User` the participant. The identifier is read from the hyperlink of the cell if there is
  one, otherwise from the text of the cell. It must contain `fadd=<identifier>`.
* `Total Rewards` the rewards of the period, for example `0.52 ETH`
* `ETH per 1000 vePENDLE (APR)` (not used)
* `vePENDLE Balance` the balance of the participant

Worksheets that miss one of these columns are skipped. Rows that do not have an identifier,
a numeric reward or a non-zero numeric balance are dropped.

## Metrics

For each participant and each period, the efficiency (also called earn rate) is:

```text
earn_rate = total_rewards / balance * 1000
```

Within a period, participants are ranked by earn rate. The best participant has the rank
number 1 and equal earn rates share the best rank number (1, 1, 3, ...). The percentile rank
is used to decide if a participant was in the top decile (percentile rank of 0.9 or more)
for this period.

All the statistics are then aggregated per participant across periods:

| column | meaning |
|--------|---------|
| `avg_rate`, `med_rate`, `best_rate` | mean, median, max earn rate |
| `months_participated` | number of periods |
| `sum_total_rewards`, `avg_total_rewards`, `med_total_rewards` | rewards |
| `sum_vependle_balance`, `avg_vependle_balance`, `med_vependle_balance` | balances |
| `top_decile_months` | number of periods in the top decile (0 if none) |
| `avg_monthly_rank_number`, `median_monthly_rank_number` | rank numbers |

## Reports

Six reports are produced, each one limited to 100 rows by default:

* `top_by_average_earn_rate` at least 4 periods, best average earn rate first
* `top_by_consistency` most periods in the top decile first
* `top_by_average_monthly_rank` at least 4 periods, lowest average rank number first
* `top_high_vependle_by_avg_rate` average balance above 80000, best average earn rate first
* `top_high_vependle_by_avg_rank` average balance above 80000, lowest average rank number first
* `top_by_median_monthly_rank` at least 4 periods, lowest median rank number first

The thresholds can be changed with a JSON settings file:

```json
{
  "minPeriods": 3,
  "balanceThreshold": 50000,
  "maxRows": 20,
  "rewardSuffix": " ETH",
  "columns": { "balance": "vePENDLE Balance" }
}
```

*/
