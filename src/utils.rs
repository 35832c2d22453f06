use nom::number::complete::be_u32;
use nom::IResult;

pub struct Utils;

impl Utils {
    pub fn be_u32_div10(input: &[u8]) -> IResult<&[u8], f64> {
        let (input, num) = be_u32(input)?;
        Ok((input, num as f64 / 10.0))
    }
}
